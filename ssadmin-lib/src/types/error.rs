use serde::{Serialize, Serializer};
use std::hash::Hash;
use thiserror::Error;

use http::StatusCode;

/// Possible errors when talking to a security server through `ssadmin_lib`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Network error while sending a request or receiving its response
    #[error("Network error while calling the security server API: {0}")]
    NetworkRequest(#[source] reqwest::Error),

    /// The response arrived but its body could not be read
    #[error("Error reading response body: {0}")]
    ReadResponseBody(#[source] reqwest::Error),

    /// The underlying request client could not be created
    #[error("Error creating request client: {0}")]
    BuildRequestClient(#[source] reqwest::Error),

    /// The security server answered with a non-success status code
    #[error("Security server rejected the request with status {status}")]
    RejectedStatusCode {
        /// Status code returned by the server
        status: StatusCode,
        /// Response body as text, often a JSON error document
        body: String,
    },

    /// An URL without a host was given as a target
    #[error("URL is missing a host")]
    InvalidUrlHost,

    /// The given string can not be parsed into a valid URL
    #[error("Cannot parse `{0}` as URL: {1}")]
    ParseUrl(String, #[source] url::ParseError),

    /// The resource path has a `{placeholder}` without a matching path parameter
    #[error("No value given for path parameter `{0}`")]
    MissingPathParam(String),

    /// A header name or value could not be parsed
    #[error("Header could not be parsed: {0}")]
    InvalidHeader(String),
}

impl ErrorKind {
    /// Status code of a rejected request, if the server answered at all
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RejectedStatusCode { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NetworkRequest(e1), Self::NetworkRequest(e2))
            | (Self::ReadResponseBody(e1), Self::ReadResponseBody(e2))
            | (Self::BuildRequestClient(e1), Self::BuildRequestClient(e2)) => {
                e1.to_string() == e2.to_string()
            }
            (
                Self::RejectedStatusCode { status: s1, body: b1 },
                Self::RejectedStatusCode { status: s2, body: b2 },
            ) => s1 == s2 && b1 == b2,
            (Self::ParseUrl(s1, e1), Self::ParseUrl(s2, e2)) => s1 == s2 && e1 == e2,
            (Self::MissingPathParam(p1), Self::MissingPathParam(p2))
            | (Self::InvalidHeader(p1), Self::InvalidHeader(p2)) => p1 == p2,
            (Self::InvalidUrlHost, Self::InvalidUrlHost) => true,
            _ => false,
        }
    }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
    fn hash<H>(&self, state: &mut H)
    where
        H: std::hash::Hasher,
    {
        match self {
            Self::NetworkRequest(e) | Self::ReadResponseBody(e) | Self::BuildRequestClient(e) => {
                e.to_string().hash(state);
            }
            Self::RejectedStatusCode { status, body } => (status.as_u16(), body).hash(state),
            Self::ParseUrl(s, e) => (s, e.to_string()).hash(state),
            Self::MissingPathParam(s) | Self::InvalidHeader(s) => s.hash(state),
            Self::InvalidUrlHost => std::mem::discriminant(self).hash(state),
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<http::header::InvalidHeaderValue> for ErrorKind {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(e.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for ErrorKind {
    fn from(e: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_status_code_display() {
        let err = ErrorKind::RejectedStatusCode {
            status: StatusCode::CONFLICT,
            body: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "Security server rejected the request with status 409 Conflict"
        );
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    }

    #[test]
    fn test_serialize_as_display_string() {
        let err = ErrorKind::MissingPathParam("id".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#""No value given for path parameter `id`""#);
        assert_eq!(err.status(), None);
    }
}
