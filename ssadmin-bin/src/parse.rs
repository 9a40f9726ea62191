use anyhow::{Context, Result, anyhow};
use http::Method;
use std::{str::FromStr, time::Duration};

/// Parse seconds into a `Duration`
pub(crate) const fn parse_duration_secs(secs: usize) -> Duration {
    Duration::from_secs(secs as u64)
}

/// Split a `key=value` argument into its parts.
///
/// Only the first `=` separates key and value, so values may contain `=`.
pub(crate) fn parse_key_value(input: &str) -> Result<(String, String)> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(anyhow!(
            "Parameter must be of the form key=value, got `{input}`"
        )),
    }
}

/// Parse an HTTP method, case-insensitively
pub(crate) fn parse_method(input: &str) -> Result<Method> {
    Method::from_str(&input.to_uppercase()).with_context(|| format!("Invalid HTTP method `{input}`"))
}

/// Parse a JSON request body
pub(crate) fn parse_json_body(input: &str) -> Result<serde_json::Value> {
    serde_json::from_str(input).context("Request body is not valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("id=DEV:COM:1234").unwrap(),
            ("id".to_string(), "DEV:COM:1234".to_string())
        );
        assert_eq!(
            parse_key_value("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_key_value("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_key_value_invalid() {
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("PATCH").unwrap(), Method::PATCH);
        assert!(parse_method("not a method").is_err());
    }

    #[test]
    fn test_parse_json_body() {
        assert_eq!(
            parse_json_body(r#"{"code": "group1"}"#).unwrap(),
            json!({"code": "group1"})
        );
        assert!(parse_json_body("{code}").is_err());
    }
}
