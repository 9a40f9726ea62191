//! Transport for the security server administration API.
//!
//! This module defines two structs, [`ApiClient`] and [`ApiClientBuilder`].
//! `ApiClient` sends one generic API call at a time, gated by a
//! [`RateGovernor`] and with every failure turned into an
//! [`EnrichedFailure`]. `ApiClientBuilder` exposes the configuration.
#![allow(clippy::module_name_repetitions)]
use std::{collections::BTreeMap, sync::Arc, time::Duration};

use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use secrecy::{ExposeSecret, SecretString};
use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    ApiResponse, ErrorKind, Result,
    diagnostics::{CallDescriptor, EnrichedFailure, Frame, enrich},
    ratelimit::{HostKey, RateGovernor},
};

/// Default timeout in seconds before a call is deemed as failed, 20.
pub const DEFAULT_TIMEOUT_SECS: usize = 20;
/// Default user agent, `ssadmin-<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("ssadmin/", env!("CARGO_PKG_VERSION"));
/// Default path of the administration API below the server URL.
pub const DEFAULT_API_BASE_PATH: &str = "/api/v1";

/// Characters left as-is when a path parameter is put into the path,
/// the unreserved set of RFC 3986
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Builder for [`ApiClient`].
///
/// ```
/// use ssadmin_lib::ApiClientBuilder;
/// use url::Url;
///
/// let client = ApiClientBuilder::builder()
///     .base_url(Url::parse("https://ss3:4000").unwrap())
///     .build()
///     .client()
///     .unwrap();
/// ```
#[derive(TypedBuilder, Debug, Clone)]
#[builder(builder_method(doc = "
Create a builder for building `ApiClientBuilder`.

On the builder call, call methods with same name as its fields to set their values.

Finally, call `.build()` to create the instance of `ApiClientBuilder`.
"))]
pub struct ApiClientBuilder {
    /// Scheme and authority of the security server, e.g. `https://ss3:4000`.
    base_url: Url,
    /// Path of the administration API below `base_url`.
    #[builder(default_code = "String::from(DEFAULT_API_BASE_PATH)", setter(into))]
    api_base_path: String,
    /// API key sent as `Authorization: X-Road-ApiKey token=<key>`.
    #[builder(default, setter(into))]
    api_key: Option<SecretString>,
    /// User-agent sent with every call.
    #[builder(default_code = "String::from(DEFAULT_USER_AGENT)", setter(into))]
    user_agent: String,
    /// Headers sent with every call, in addition to the per-call headers of
    /// the [`CallDescriptor`].
    #[builder(default)]
    custom_headers: HeaderMap,
    /// Response timeout per call.
    #[builder(default = Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS as u64)))]
    timeout: Option<Duration>,
    /// When `true`, accept invalid TLS certificates.
    ///
    /// Security servers commonly run with a self-signed certificate on the
    /// admin port. Only use this on trusted networks.
    #[builder(default)]
    allow_insecure: bool,
    /// Rate governor shared by every client talking to the same hosts.
    #[builder(default)]
    governor: Arc<RateGovernor>,
}

impl ApiClientBuilder {
    /// Instantiates an [`ApiClient`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if:
    /// - The user-agent or the API key is not a valid header value.
    /// - The request client cannot be created.
    ///   See [here](https://docs.rs/reqwest/latest/reqwest/struct.ClientBuilder.html#errors).
    pub fn client(self) -> Result<ApiClient> {
        let Self {
            base_url,
            api_base_path,
            api_key,
            user_agent,
            custom_headers: mut headers,
            timeout,
            allow_insecure,
            governor,
        } = self;

        headers.insert(header::USER_AGENT, HeaderValue::from_str(&user_agent)?);

        if let Some(api_key) = api_key {
            let mut value =
                HeaderValue::from_str(&format!("X-Road-ApiKey token={}", api_key.expose_secret()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let builder = reqwest::ClientBuilder::new()
            .gzip(true)
            .default_headers(headers)
            .danger_accept_invalid_certs(allow_insecure);

        let reqwest_client = (match timeout {
            Some(t) => builder.timeout(t),
            None => builder,
        })
        .build()
        .map_err(ErrorKind::BuildRequestClient)?;

        Ok(ApiClient {
            reqwest_client,
            base_url,
            api_base_path: normalize_base_path(&api_base_path),
            governor,
        })
    }
}

/// Sends calls to one security server.
///
/// See [`ApiClientBuilder`] for the configuration options.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Underlying `reqwest` client instance that handles the HTTP requests.
    reqwest_client: reqwest::Client,
    /// Scheme and authority of the security server.
    base_url: Url,
    /// API path prefix, either empty or starting with `/` and without a trailing `/`.
    api_base_path: String,
    /// Shared rate governor.
    governor: Arc<RateGovernor>,
}

impl ApiClient {
    /// Send a single call.
    ///
    /// `frames` is the call stack of the caller, innermost first. It is only
    /// looked at when the call fails.
    ///
    /// # Errors
    ///
    /// Returns an [`EnrichedFailure`] if
    /// - the URL cannot be built from the descriptor,
    /// - the request cannot be sent or its response cannot be read,
    /// - the server answers with a status outside of 2xx.
    pub async fn call(
        &self,
        api_call: CallDescriptor,
        frames: &[Frame],
        body: Option<&serde_json::Value>,
    ) -> std::result::Result<ApiResponse, EnrichedFailure> {
        match self.execute(&api_call, body).await {
            Ok(response) => Ok(response),
            Err(e) => Err(enrich(e, api_call, frames)),
        }
    }

    async fn execute(
        &self,
        api_call: &CallDescriptor,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse> {
        let url = self.resolve(api_call)?;
        let headers = header_map(&api_call.header_params)?;

        self.governor.acquire(&HostKey::try_from(&url)?).await;

        debug!("{} {url}", api_call.method);
        let mut request = self
            .reqwest_client
            .request(api_call.method.clone(), url)
            .headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ErrorKind::NetworkRequest)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(ErrorKind::ReadResponseBody)?;

        if !status.is_success() {
            return Err(ErrorKind::RejectedStatusCode { status, body });
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    /// Build the full URL of a call.
    ///
    /// # Errors
    ///
    /// Returns an error if a `{placeholder}` of the resource path has no
    /// path parameter or the resulting URL is invalid.
    pub fn resolve(&self, api_call: &CallDescriptor) -> Result<Url> {
        let path = expand_path(&api_call.resource_path, &api_call.path_params)?;
        let raw = format!(
            "{}{}{path}",
            self.base_url.as_str().trim_end_matches('/'),
            self.api_base_path
        );

        let mut url = Url::parse(&raw).map_err(|e| ErrorKind::ParseUrl(raw.clone(), e))?;
        if !api_call.query_params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(api_call.query_params.iter());
        }
        Ok(url)
    }

    /// The rate governor of this client
    #[must_use]
    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }
}

fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Replace each `{name}` in `template` by the percent-encoded path parameter
fn expand_path(template: &str, params: &BTreeMap<String, String>) -> Result<String> {
    let mut path = String::with_capacity(template.len());
    if !template.starts_with('/') {
        path.push('/');
    }

    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|offset| open + offset) else {
            break;
        };
        let name = &rest[open + 1..close];
        let value = params
            .get(name)
            .ok_or_else(|| ErrorKind::MissingPathParam(name.to_string()))?;

        path.push_str(&rest[..open]);
        path.extend(utf8_percent_encode(value, PATH_SEGMENT));
        rest = &rest[close + 1..];
    }
    path.push_str(rest);

    Ok(path)
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut header_map = HeaderMap::new();
    for (name, value) in headers {
        header_map.insert(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }
    Ok(header_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::RateLimitConfig;
    use http::{Method, StatusCode};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::HashMap;
    use test_utils::{frames, mock_api};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClientBuilder::builder()
            .base_url(Url::parse(&server.uri()).unwrap())
            .build()
            .client()
            .unwrap()
    }

    fn stack() -> Vec<Frame> {
        frames![
            ("ssadmin-bin/src/api.rs", "send_request"),
            ("ssadmin-bin/src/controllers/request.rs", "request"),
            ("ssadmin-bin/src/main.rs", "run"),
        ]
    }

    #[rstest]
    #[case("/clients", "https://ss3:4000/api/v1/clients")]
    #[case("clients", "https://ss3:4000/api/v1/clients")]
    #[case("/clients/{id}", "https://ss3:4000/api/v1/clients/DEV%3ACOM%3A1234")]
    #[case("/tokens/{token}/keys/{id}", "https://ss3:4000/api/v1/tokens/0/keys/DEV%3ACOM%3A1234")]
    fn test_resolve_path(#[case] resource_path: &str, #[case] expected: &str) {
        let client = ApiClientBuilder::builder()
            .base_url(Url::parse("https://ss3:4000").unwrap())
            .build()
            .client()
            .unwrap();
        let call = CallDescriptor::new(Method::GET, resource_path)
            .path_param("id", "DEV:COM:1234")
            .path_param("token", "0");

        assert_eq!(client.resolve(&call).unwrap().as_str(), expected);
    }

    #[test]
    fn test_resolve_query_and_base_path() {
        let client = ApiClientBuilder::builder()
            .base_url(Url::parse("https://ss3:4000/").unwrap())
            .api_base_path("/proxy/api/v2/")
            .build()
            .client()
            .unwrap();
        let call = CallDescriptor::new(Method::GET, "/clients")
            .query_param("show_members", "false")
            .query_param("name", "Test Service");

        assert_eq!(
            client.resolve(&call).unwrap().as_str(),
            "https://ss3:4000/proxy/api/v2/clients?name=Test+Service&show_members=false"
        );
    }

    #[test]
    fn test_resolve_missing_path_param() {
        let client = ApiClientBuilder::builder()
            .base_url(Url::parse("https://ss3:4000").unwrap())
            .build()
            .client()
            .unwrap();
        let call = CallDescriptor::new(Method::DELETE, "/clients/{id}");

        assert_eq!(
            client.resolve(&call),
            Err(ErrorKind::MissingPathParam("id".to_string()))
        );
    }

    #[test]
    fn test_invalid_user_agent() {
        let result = ApiClientBuilder::builder()
            .base_url(Url::parse("https://ss3:4000").unwrap())
            .user_agent("line\nbreak")
            .build()
            .client();
        assert!(matches!(result, Err(ErrorKind::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_successful_call() {
        let mock_server = mock_api!(
            "GET",
            "/api/v1/clients",
            StatusCode::OK,
            set_body_json(json!([{"id": "DEV:COM:1234"}]))
        );
        let client = client_for(&mock_server);

        let response = client
            .call(CallDescriptor::new(Method::GET, "/clients"), &stack(), None)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let clients: serde_json::Value = response.json().unwrap();
        assert_eq!(clients[0]["id"], "DEV:COM:1234");
    }

    #[tokio::test]
    async fn test_call_sends_parameters_headers_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/clients/1234/local-groups"))
            .and(query_param("dry_run", "true"))
            .and(header("x-request-id", "42"))
            .and(header("authorization", "X-Road-ApiKey token=3c5b8a1e"))
            .and(body_json(json!({"code": "group1"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ApiClientBuilder::builder()
            .base_url(Url::parse(&mock_server.uri()).unwrap())
            .api_key(SecretString::from("3c5b8a1e"))
            .build()
            .client()
            .unwrap();
        let call = CallDescriptor::new(Method::POST, "/clients/{id}/local-groups")
            .path_param("id", "1234")
            .query_param("dry_run", "true")
            .header_param("X-Request-Id", "42");

        let response = client
            .call(call, &stack(), Some(&json!({"code": "group1"})))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_rejected_call_is_enriched() {
        let mock_server = mock_api!(
            "DELETE",
            "/api/v1/clients/1234",
            StatusCode::CONFLICT,
            set_body_string(r#"{"status":409,"error":{"code":"action_not_possible"}}"#)
        );
        let client = client_for(&mock_server);
        let call = CallDescriptor::new(Method::DELETE, "/clients/{id}").path_param("id", "1234");

        let failure = client.call(call.clone(), &stack(), None).await.unwrap_err();

        assert_eq!(
            failure.error(),
            &ErrorKind::RejectedStatusCode {
                status: StatusCode::CONFLICT,
                body: r#"{"status":409,"error":{"code":"action_not_possible"}}"#.to_string(),
            }
        );
        assert_eq!(failure.api_call(), &call);
        assert_eq!(failure.controller_func(), Some("request.rs:request"));
        assert_eq!(failure.module_func(), Some("api.rs:send_request"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_enriched() {
        // Nothing listens on a port once its listener is dropped
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let base_url = Url::parse(&format!("http://{addr}")).unwrap();

        let client = ApiClientBuilder::builder()
            .base_url(base_url)
            .build()
            .client()
            .unwrap();
        let call = CallDescriptor::new(Method::GET, "/system/status");

        let failure = client.call(call.clone(), &[], None).await.unwrap_err();

        assert!(matches!(failure.error(), ErrorKind::NetworkRequest(_)));
        assert_eq!(failure.api_call(), &call);
        assert_eq!(failure.controller_func(), None);
    }

    #[tokio::test]
    async fn test_unresolved_call_skips_governor() {
        let governor = Arc::new(RateGovernor::default());
        let client = ApiClientBuilder::builder()
            .base_url(Url::parse("https://ss3:4000").unwrap())
            .governor(governor.clone())
            .build()
            .client()
            .unwrap();

        let failure = client
            .call(CallDescriptor::new(Method::GET, "/clients/{id}"), &stack(), None)
            .await
            .unwrap_err();

        assert_eq!(failure.error(), &ErrorKind::MissingPathParam("id".to_string()));
        assert_eq!(failure.controller_func(), Some("request.rs:request"));
        assert_eq!(governor.active_host_count(), 0);
    }

    #[tokio::test]
    async fn test_calls_are_counted_by_shared_governor() {
        let mock_server = mock_api!("GET", "/api/v1/system/version", StatusCode::OK);
        let governor = Arc::new(RateGovernor::new(RateLimitConfig::default(), HashMap::new()));
        let build = || {
            ApiClientBuilder::builder()
                .base_url(Url::parse(&mock_server.uri()).unwrap())
                .governor(governor.clone())
                .build()
                .client()
                .unwrap()
        };
        let first = build();
        let second = build();

        for client in [&first, &second] {
            client
                .call(CallDescriptor::new(Method::GET, "/system/version"), &[], None)
                .await
                .unwrap();
        }

        let key = HostKey::try_from(&Url::parse(&mock_server.uri()).unwrap()).unwrap();
        assert_eq!(governor.active_host_count(), 1);
        assert_eq!(governor.host_stats(&key).total_calls, 2);
        assert!(Arc::ptr_eq(first.governor(), second.governor()));
    }
}
