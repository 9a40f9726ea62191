use anyhow::{Context, Result};
use ssadmin_lib::ApiResponse;
use ssadmin_lib::diagnostics::EnrichedFailure;

/// A trait for formatting the outcome of a single call
pub(crate) trait ResponseFormatter: Send + Sync {
    /// Format a successful response
    fn format_response(&self, response: &ApiResponse) -> Result<String>;

    /// Format a failed call. Failures are always reported as JSON so they
    /// can be picked up by scripts.
    fn format_failure(&self, failure: &EnrichedFailure) -> Result<String> {
        serde_json::to_string_pretty(failure).context("Cannot format failure as JSON")
    }
}

/// Prints the response body as sent by the server.
///
/// JSON bodies are pretty-printed, anything else is passed through.
pub(crate) struct CompactFormatter;

impl ResponseFormatter for CompactFormatter {
    fn format_response(&self, response: &ApiResponse) -> Result<String> {
        match serde_json::from_str::<serde_json::Value>(&response.body) {
            Ok(json) => serde_json::to_string_pretty(&json).context("Cannot format response body"),
            Err(_) => Ok(response.body.clone()),
        }
    }
}

/// Prints status and body as a single JSON document
pub(crate) struct JsonFormatter;

impl ResponseFormatter for JsonFormatter {
    fn format_response(&self, response: &ApiResponse) -> Result<String> {
        serde_json::to_string_pretty(response).context("Cannot format response as JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use ssadmin_lib::ErrorKind;
    use ssadmin_lib::diagnostics::{CallDescriptor, Frame, enrich};

    fn response(body: &str) -> ApiResponse {
        ApiResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_compact_pretty_prints_json() {
        let formatted = CompactFormatter
            .format_response(&response(r#"{"id":"DEV:COM:1234"}"#))
            .unwrap();
        assert_eq!(formatted, "{\n  \"id\": \"DEV:COM:1234\"\n}");
    }

    #[test]
    fn test_compact_passes_text_through() {
        let formatted = CompactFormatter.format_response(&response("OK")).unwrap();
        assert_eq!(formatted, "OK");
    }

    #[test]
    fn test_json_response() {
        let formatted = JsonFormatter
            .format_response(&response(r#"{"initialized":true}"#))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(value, json!({"status": 200, "body": {"initialized": true}}));
    }

    #[test]
    fn test_failure_as_json() {
        let failure = enrich(
            ErrorKind::MissingPathParam("id".to_string()),
            CallDescriptor::new(Method::GET, "/clients/{id}"),
            &[
                Frame::new("src/api.rs", "send_request"),
                Frame::new("src/controllers/request.rs", "request"),
            ],
        );

        for formatter in [
            Box::new(CompactFormatter) as Box<dyn ResponseFormatter>,
            Box::new(JsonFormatter),
        ] {
            let formatted = formatter.format_failure(&failure).unwrap();
            let value: serde_json::Value = serde_json::from_str(&formatted).unwrap();
            assert_eq!(value["controller_func"], "request.rs:request");
            assert_eq!(value["module_func"], "api.rs:send_request");
            assert_eq!(value["api_call"]["resource_path"], "/clients/{id}");
        }
    }
}
