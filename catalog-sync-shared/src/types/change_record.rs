//! Outbox change record types.
//!
//! A change record is appended to the change log in the same transaction as
//! the catalog mutation it describes. The outbox worker drains pending records
//! into incremental search index updates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::product::Product;

/// The only entity type the search synchronization acts on.
pub const PRODUCT_ENTITY_TYPE: &str = "product";

/// The catalog mutation a change record describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
    /// An action written by a newer catalog writer that this version does not know.
    #[serde(other)]
    Unknown,
}

impl ChangeAction {
    /// The value stored in the change log `action` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
            ChangeAction::Unknown => "unknown",
        }
    }

    /// Parse a stored action. Unrecognized values map to [`ChangeAction::Unknown`].
    pub fn from_db(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "create" => ChangeAction::Create,
            "update" => ChangeAction::Update,
            "delete" => ChangeAction::Delete,
            _ => ChangeAction::Unknown,
        }
    }

    /// Whether this action results in an upsert of the entity's document.
    pub fn is_upsert(&self) -> bool {
        matches!(self, ChangeAction::Create | ChangeAction::Update)
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the change log (outbox).
///
/// `processed_at == None` means the record is pending. Once set, the record is
/// immutable and becomes eligible for the retention sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRecord {
    /// Monotonic identifier assigned by the log.
    pub id: i64,
    pub entity_type: String,
    pub entity_id: i32,
    pub action: ChangeAction,
    /// Serialized snapshot of the entity at write time. Empty for deletes.
    pub payload: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl ChangeRecord {
    /// Create a pending product change record.
    pub fn product(id: i64, entity_id: i32, action: ChangeAction, payload: Option<Value>) -> Self {
        Self {
            id,
            entity_type: PRODUCT_ENTITY_TYPE.to_string(),
            entity_id,
            action,
            payload,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Whether the record still awaits processing.
    pub fn is_pending(&self) -> bool {
        self.processed_at.is_none()
    }

    /// Whether the record describes a product mutation.
    pub fn is_product(&self) -> bool {
        self.entity_type == PRODUCT_ENTITY_TYPE
    }

    /// Decode the embedded product snapshot.
    ///
    /// Returns `Ok(None)` when the record carries no snapshot (missing column
    /// or JSON `null`), and an error when a snapshot exists but cannot be decoded.
    pub fn product_snapshot(&self) -> Result<Option<Product>, serde_json::Error> {
        match &self.payload {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Product::deserialize(value).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_round_trips_through_db_value() {
        for action in [ChangeAction::Create, ChangeAction::Update, ChangeAction::Delete] {
            assert_eq!(ChangeAction::from_db(action.as_str()), action);
        }
        assert_eq!(ChangeAction::from_db("DELETE"), ChangeAction::Delete);
        assert_eq!(ChangeAction::from_db("archive"), ChangeAction::Unknown);
    }

    #[test]
    fn test_unknown_action_deserializes() {
        let action: ChangeAction = serde_json::from_str("\"archive\"").unwrap();
        assert_eq!(action, ChangeAction::Unknown);
    }

    #[test]
    fn test_product_snapshot() {
        let record = ChangeRecord::product(
            1,
            42,
            ChangeAction::Create,
            Some(json!({"id": 42, "categoryId": 7, "name": "Kettle"})),
        );
        let product = record.product_snapshot().unwrap().unwrap();
        assert_eq!(product.id, 42);
        assert_eq!(product.category_id, 7);
        assert!(record.is_pending());
        assert!(record.is_product());
    }

    #[test]
    fn test_missing_and_null_snapshot() {
        let record = ChangeRecord::product(1, 42, ChangeAction::Delete, None);
        assert!(record.product_snapshot().unwrap().is_none());

        let record = ChangeRecord::product(2, 42, ChangeAction::Update, Some(Value::Null));
        assert!(record.product_snapshot().unwrap().is_none());
    }

    #[test]
    fn test_malformed_snapshot() {
        let record =
            ChangeRecord::product(1, 42, ChangeAction::Update, Some(json!({"name": "no id"})));
        assert!(record.product_snapshot().is_err());

        let record = ChangeRecord::product(2, 42, ChangeAction::Update, Some(json!("garbage")));
        assert!(record.product_snapshot().is_err());
    }
}
