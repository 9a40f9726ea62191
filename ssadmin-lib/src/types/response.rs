use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde::ser::SerializeStruct;

/// A successful answer from the security server.
///
/// The body is read eagerly so the response can outlive the connection.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Status code, always in the 2xx range
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as text
    pub body: String,
}

impl ApiResponse {
    /// Parse the body as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

impl Serialize for ApiResponse {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut response = s.serialize_struct("ApiResponse", 2)?;
        response.serialize_field("status", &self.status.as_u16())?;
        match serde_json::from_str::<serde_json::Value>(&self.body) {
            Ok(json) => response.serialize_field("body", &json)?,
            Err(_) => response.serialize_field("body", &self.body)?,
        }
        response.end()
    }
}
