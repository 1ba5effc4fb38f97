//! Parsing of raw remote documents into entity models.
//!
//! A malformed document is reported as [`ParsedDocument::Malformed`] with a reason
//! instead of being silently dropped, so the pull job can log and count it.

use crate::{entities::SyncEntity, remote::RawDocument};
use serde_json::Value;

/// Result of parsing one remote document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument<M> {
    /// The document decoded into a model
    Parsed(M),
    /// The document could not be decoded
    Malformed {
        /// Document id as found remotely
        raw_id: String,
        /// Why decoding failed
        reason: String,
    },
}

impl<M> ParsedDocument<M> {
    /// The parsed model, if any.
    pub fn into_parsed(self) -> Option<M> {
        match self {
            Self::Parsed(model) => Some(model),
            Self::Malformed { .. } => None,
        }
    }

    fn malformed(raw_id: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            raw_id: raw_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Whether a payload key value names the same document as `document_id`.
fn key_matches(value: &Value, document_id: &str) -> bool {
    match value {
        Value::String(s) => s == document_id,
        Value::Number(n) => n.to_string() == document_id,
        _ => false,
    }
}

/// Parses `raw`, found under `owner`'s path, into a model of entity `E`.
///
/// - the payload must be a JSON object
/// - a missing key field is taken from the document id (an integer for owned
///   collections); a key that disagrees with the document id is malformed
/// - a missing owner field is taken from the path; a different owner is malformed
pub fn parse_document<E: SyncEntity>(owner: &str, raw: RawDocument) -> ParsedDocument<E::Model> {
    let RawDocument { id, data } = raw;
    let Value::Object(mut fields) = data else {
        return ParsedDocument::malformed(&id, "document is not an object");
    };

    match fields.get(E::ID_FIELD) {
        None | Some(Value::Null) => {
            let key = if E::COLLECTION.is_some() {
                match id.parse::<i64>() {
                    Ok(key) => Value::from(key),
                    Err(_) => {
                        return ParsedDocument::malformed(
                            &id,
                            format!("document id is not an integer {}", E::ID_FIELD),
                        );
                    }
                }
            } else {
                Value::String(id.clone())
            };
            fields.insert(E::ID_FIELD.to_string(), key);
        }
        Some(value) if key_matches(value, &id) => {}
        Some(value) => {
            return ParsedDocument::malformed(
                &id,
                format!("{} {value} does not match the document id", E::ID_FIELD),
            );
        }
    }

    match fields.get(E::OWNER_FIELD) {
        None | Some(Value::Null) => {
            fields.insert(E::OWNER_FIELD.to_string(), Value::String(owner.to_string()));
        }
        Some(Value::String(found)) if found == owner => {}
        Some(found) => {
            return ParsedDocument::malformed(
                &id,
                format!("owned by {found}, expected {owner}"),
            );
        }
    }

    match serde_json::from_value(Value::Object(fields)) {
        Ok(model) => ParsedDocument::Parsed(model),
        Err(e) => ParsedDocument::malformed(&id, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::{Expense, User};
    use crate::test_utils::{malformed_document, sample_expense, sample_user, to_document};
    use serde_json::json;

    #[test]
    fn test_parses_well_formed_document() {
        let expense = sample_expense(5, "u1", 2);
        let parsed = parse_document::<Expense>("u1", RawDocument::new("5", to_document(&expense)));

        let ParsedDocument::Parsed(model) = parsed else {
            panic!("expected a parsed expense");
        };
        assert_eq!(model, expense);
        assert!(!model.synced);
    }

    #[test]
    fn test_synced_flag_is_not_part_of_the_payload() {
        let mut expense = sample_expense(5, "u1", 2);
        expense.synced = true;
        let document = to_document(&expense);
        assert!(document.get("synced").is_none());
        assert_eq!(document["expenseId"], json!(5));
        assert_eq!(document["date"], json!("2024-03-15"));
    }

    #[test]
    fn test_fills_key_and_owner_from_path() {
        let data = json!({
            "categoryId": 2,
            "title": "Taxi",
            "amount": 18.0,
            "date": "2024-04-02"
        });
        let parsed = parse_document::<Expense>("u1", RawDocument::new("11", data))
            .into_parsed()
            .unwrap_or_else(|| panic!("expected a parsed expense"));

        assert_eq!(parsed.expense_id, 11);
        assert_eq!(parsed.user_id, "u1");
        assert_eq!(parsed.amount, 18.0);
        assert_eq!(parsed.last_updated_timestamp, 0);
    }

    #[test]
    fn test_malformed_fields() {
        let parsed = parse_document::<Expense>("u1", RawDocument::new("3", malformed_document()));
        assert!(matches!(
            parsed,
            ParsedDocument::Malformed { ref raw_id, reason: _ } if raw_id == "3"
        ));
    }

    #[test]
    fn test_non_object_and_bad_ids() {
        let not_object = parse_document::<Expense>("u1", RawDocument::new("1", json!([1, 2])));
        assert!(not_object.into_parsed().is_none());

        let data = to_document(&sample_expense(5, "u1", 2));
        let mut without_key = data.clone();
        if let Some(fields) = without_key.as_object_mut() {
            fields.remove("expenseId");
        }
        let bad_id = parse_document::<Expense>("u1", RawDocument::new("abc", without_key));
        assert!(bad_id.into_parsed().is_none());

        let mismatch = parse_document::<Expense>("u1", RawDocument::new("6", data));
        assert!(mismatch.into_parsed().is_none());
    }

    #[test]
    fn test_foreign_owner_is_malformed() {
        let data = to_document(&sample_expense(5, "u2", 2));
        let parsed = parse_document::<Expense>("u1", RawDocument::new("5", data));
        let ParsedDocument::Malformed { reason, .. } = parsed else {
            panic!("expected malformed");
        };
        assert!(reason.contains("expected u1"));
    }

    #[test]
    fn test_profile_uses_string_key() {
        let mut data = to_document(&sample_user("u1"));
        if let Some(fields) = data.as_object_mut() {
            fields.remove("userId");
        }
        let parsed = parse_document::<User>("u1", RawDocument::new("u1", data))
            .into_parsed()
            .unwrap_or_else(|| panic!("expected a parsed profile"));
        assert_eq!(parsed.user_id, "u1");
        assert_eq!(parsed.currency, "EUR");
    }
}
