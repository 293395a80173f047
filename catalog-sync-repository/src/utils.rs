//! Utility functions for the catalog sync repository.

use crate::errors::SearchIndexError;

/// Parse a search document id back into the catalog product id.
///
/// Document ids are the decimal product id, so this is the inverse of
/// `ProductDocument::document_id`.
///
/// # Example
///
/// ```
/// use catalog_sync_repository::parse_document_id;
///
/// assert_eq!(parse_document_id("42").unwrap(), 42);
/// assert!(parse_document_id("forty-two").is_err());
/// ```
pub fn parse_document_id(document_id: &str) -> Result<i32, SearchIndexError> {
    document_id.trim().parse::<i32>().map_err(|e| {
        SearchIndexError::validation(format!("Invalid document id '{}': {}", document_id, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_id() {
        assert_eq!(parse_document_id("42").unwrap(), 42);
        assert_eq!(parse_document_id(" 7 ").unwrap(), 7);
    }

    #[test]
    fn test_parse_document_id_invalid() {
        for input in ["", "abc", "1.5", "99999999999"] {
            let result = parse_document_id(input);
            assert!(
                matches!(result, Err(SearchIndexError::ValidationError(_))),
                "expected validation error for '{}'",
                input
            );
        }
    }
}
