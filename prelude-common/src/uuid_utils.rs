//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new entity identifier (hyphenated UUIDv4 string)
///
/// Entity ids inside the project document are opaque strings; older payloads
/// may carry ids that are not UUIDs at all.
pub fn new_id() -> String {
    generate().to_string()
}

/// Parse UUID from string
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_id_is_parseable_uuid() {
        let id = new_id();
        assert!(parse(&id).is_ok());
    }

    #[test]
    fn test_new_ids_never_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
