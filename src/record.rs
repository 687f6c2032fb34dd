//! Mutation records
//!
//! The tagged values written to the command log. `Get` and `Scan` are never
//! recorded; `Put` and `Swap` carry distinct tags for traceability but have
//! identical effect on the index.

use serde::{Deserialize, Serialize};

use crate::index::Index;

/// One logged mutation
///
/// The JSON form of this enum is the file-backed log's frame payload:
/// `{"op":"put","key":...,"value":...}` and so on. Opcodes outside the three
/// variants fail to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum MutationRecord {
    /// Install (key, value), replacing any prior entry
    Put { key: String, value: String },

    /// Same effect as Put; the reply returns the displaced value
    Swap { key: String, value: String },

    /// Remove key if present
    Delete { key: String },
}

impl MutationRecord {
    /// Key this record mutates
    pub fn key(&self) -> &str {
        match self {
            MutationRecord::Put { key, .. } => key,
            MutationRecord::Swap { key, .. } => key,
            MutationRecord::Delete { key } => key,
        }
    }

    /// Apply this record to the index
    ///
    /// Return values from the index are discarded: during recovery nobody
    /// observes them, and during live mutation the engine has already read
    /// the pre-image before the record reached the log.
    pub fn apply(self, index: &mut Index) {
        match self {
            MutationRecord::Put { key, value } | MutationRecord::Swap { key, value } => {
                index.upsert(key, value);
            }
            MutationRecord::Delete { key } => {
                index.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_swap_apply_identically() {
        let mut a = Index::new();
        let mut b = Index::new();

        MutationRecord::Put {
            key: "k".to_string(),
            value: "v".to_string(),
        }
        .apply(&mut a);
        MutationRecord::Swap {
            key: "k".to_string(),
            value: "v".to_string(),
        }
        .apply(&mut b);

        assert_eq!(a.get("k"), Some("v"));
        assert_eq!(b.get("k"), Some("v"));
    }

    #[test]
    fn test_delete_of_absent_key_is_a_no_op() {
        let mut index = Index::new();
        MutationRecord::Delete {
            key: "missing".to_string(),
        }
        .apply(&mut index);
        assert!(index.is_empty());
    }

    #[test]
    fn test_json_form_is_tagged_by_op() {
        let record = MutationRecord::Put {
            key: "a".to_string(),
            value: "1".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"op":"put","key":"a","value":"1"}"#);

        let record = MutationRecord::Delete {
            key: "a".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"op":"delete","key":"a"}"#);
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let err = serde_json::from_str::<MutationRecord>(r#"{"op":"merge","key":"a"}"#);
        assert!(err.is_err());
    }
}
