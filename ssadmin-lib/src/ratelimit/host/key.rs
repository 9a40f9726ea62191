use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::ErrorKind;
use crate::types::Result;

/// The scheme and authority of a remote API endpoint, used as the rate
/// limiting key.
///
/// Two calls share a budget exactly when their keys are equal, so
/// `https://ss3:4000` and `https://ss3:4001` are throttled independently.
///
/// # Examples
///
/// ```
/// use ssadmin_lib::ratelimit::HostKey;
/// use url::Url;
///
/// let url = Url::parse("https://ss3:4000/api/v1/clients?show_members=true").unwrap();
/// let host_key = HostKey::try_from(&url).unwrap();
/// assert_eq!(host_key.as_str(), "https://ss3:4000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostKey(String);

impl HostKey {
    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the key as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<&Url> for HostKey {
    type Error = ErrorKind;

    fn try_from(url: &Url) -> Result<Self> {
        let host = url.host_str().ok_or(ErrorKind::InvalidUrlHost)?;

        // `Url::port` is `None` for the scheme's default port
        Ok(match url.port() {
            Some(port) => HostKey(format!("{}://{host}:{port}", url.scheme())),
            None => HostKey(format!("{}://{host}", url.scheme())),
        })
    }
}

impl TryFrom<Url> for HostKey {
    type Error = ErrorKind;

    fn try_from(url: Url) -> Result<Self> {
        HostKey::try_from(&url)
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HostKey {
    fn from(host: String) -> Self {
        HostKey(host)
    }
}

impl From<&str> for HostKey {
    fn from(host: &str) -> Self {
        HostKey(host.to_string())
    }
}

impl Serialize for HostKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HostKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(HostKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://ss3:4000/api/v1/clients", "https://ss3:4000")]
    #[case("https://SS3:4000/", "https://ss3:4000")]
    #[case("https://ss3:443/api", "https://ss3")]
    #[case("http://10.0.0.7:8080", "http://10.0.0.7:8080")]
    #[case("https://[::1]:4000/api", "https://[::1]:4000")]
    fn test_host_key_from_url(#[case] url: &str, #[case] expected: &str) {
        let url = Url::parse(url).unwrap();
        let host_key = HostKey::try_from(&url).unwrap();
        assert_eq!(host_key.as_str(), expected);
    }

    #[test]
    fn test_host_key_port_separation() {
        let first = HostKey::try_from(Url::parse("https://ss3:4000/").unwrap()).unwrap();
        let second = HostKey::try_from(Url::parse("https://ss3:4001/").unwrap()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_host_key_from_string_is_kept_verbatim() {
        let host_key = HostKey::from("https://ss3:4000");
        assert_eq!(host_key.as_str(), "https://ss3:4000");
        assert_eq!(format!("{host_key}"), "https://ss3:4000");
    }

    #[test]
    fn test_host_key_no_host() {
        let url = Url::parse("file:///path/to/file").unwrap();
        let result = HostKey::try_from(&url);
        assert_eq!(result, Err(ErrorKind::InvalidUrlHost));
    }

    #[test]
    fn test_host_key_as_map_key() {
        use std::collections::HashMap;

        let map: HashMap<HostKey, u32> =
            toml::from_str(r#""https://ss3:4000" = 1"#).unwrap();
        assert_eq!(map.get(&HostKey::from("https://ss3:4000")), Some(&1));
    }
}
