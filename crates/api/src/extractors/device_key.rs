//! Device key query parameter.

use serde::Deserialize;

/// The `key` query parameter accepted by the single-device endpoint.
///
/// Presence of the parameter commits the caller to key authentication,
/// even when operator credentials are also supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_query_absent() {
        let query: KeyQuery = serde_json::from_str("{}").unwrap();
        assert!(query.key.is_none());
    }

    #[test]
    fn test_key_query_present() {
        let query: KeyQuery = serde_json::from_str(r#"{"key":"abc123"}"#).unwrap();
        assert_eq!(query.key.as_deref(), Some("abc123"));
    }
}
