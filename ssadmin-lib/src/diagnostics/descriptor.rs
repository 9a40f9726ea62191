use http::Method;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// The shape of one outbound request.
///
/// Owned by the calling code and handed to the enricher when the call
/// fails. Parameter maps are ordered so diagnostics are stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallDescriptor {
    /// HTTP method, e.g. `GET` or `PATCH`
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    /// Resource path relative to the API base, may contain `{name}` placeholders
    pub resource_path: String,
    /// Values for the placeholders in `resource_path`
    pub path_params: BTreeMap<String, String>,
    /// Query string parameters
    pub query_params: BTreeMap<String, String>,
    /// Request specific headers
    pub header_params: BTreeMap<String, String>,
}

impl CallDescriptor {
    /// Create a descriptor without any parameters
    #[must_use]
    pub fn new(method: Method, resource_path: impl Into<String>) -> Self {
        Self {
            method,
            resource_path: resource_path.into(),
            path_params: BTreeMap::new(),
            query_params: BTreeMap::new(),
            header_params: BTreeMap::new(),
        }
    }

    /// Add a value for a `{name}` placeholder of the resource path
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Add a query string parameter
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    /// Add a header sent with this request only
    #[must_use]
    pub fn header_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_params.insert(name.into(), value.into());
        self
    }
}

fn serialize_method<S>(method: &Method, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(method.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_builder_methods() {
        let call = CallDescriptor::new(Method::GET, "/clients/{id}")
            .path_param("id", "DEV:COM:1234:TestService")
            .query_param("show_members", "false")
            .header_param("Accept", "application/json");

        assert_eq!(call.method, Method::GET);
        assert_eq!(call.resource_path, "/clients/{id}");
        assert_eq!(call.path_params["id"], "DEV:COM:1234:TestService");
        assert_eq!(call.query_params["show_members"], "false");
        assert_eq!(call.header_params["Accept"], "application/json");
    }

    #[test]
    fn test_serialize_descriptor() {
        let call = CallDescriptor::new(Method::PUT, "/tokens/{id}/login").path_param("id", "0");

        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "method": "PUT",
                "resource_path": "/tokens/{id}/login",
                "path_params": {"id": "0"},
                "query_params": {},
                "header_params": {},
            })
        );
    }
}
