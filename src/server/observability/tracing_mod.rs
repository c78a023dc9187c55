// Request correlation

use axum::http::Extensions;
use uuid::Uuid;

/// Generate a new request ID
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Request ID stored in request extensions by the tracking middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Id of the current request, or `-` outside the tracking middleware
    pub fn of(extensions: &Extensions) -> &str {
        extensions
            .get::<RequestId>()
            .map(|RequestId(id)| id.as_str())
            .unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique_uuids() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_request_id_from_extensions() {
        let mut extensions = Extensions::new();
        assert_eq!(RequestId::of(&extensions), "-");

        extensions.insert(RequestId("abc-123".to_string()));
        assert_eq!(RequestId::of(&extensions), "abc-123");
    }
}
