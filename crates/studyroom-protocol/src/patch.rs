//! Structural state patches.
//!
//! The authoritative room never ships its state object as a blob. It sends
//! an ordered list of operations against named scalar fields and named
//! collections; the client applies them to its mirror in order and raises
//! one "state changed" signal per patch.
//!
//! Collections come in two shapes: lists (`push`, `clear`) and keyed maps
//! (`put`, `delete`, `clear`). Entries are schema [`Record`]s.

use serde::{Deserialize, Serialize};

use crate::{FieldValue, Record};

/// One operation on the mirrored state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    /// Set a scalar field.
    Field { name: String, value: FieldValue },
    /// Append to a list collection.
    Push { collection: String, record: Record },
    /// Insert or replace an entry of a keyed collection.
    Put {
        collection: String,
        key: String,
        record: Record,
    },
    /// Remove an entry of a keyed collection. Missing keys are ignored.
    Delete { collection: String, key: String },
    /// Empty a collection of either shape.
    Clear { collection: String },
}

impl PatchOp {
    /// The collection this op targets, `None` for scalar fields.
    pub fn collection(&self) -> Option<&str> {
        match self {
            Self::Field { .. } => None,
            Self::Push { collection, .. }
            | Self::Put { collection, .. }
            | Self::Delete { collection, .. }
            | Self::Clear { collection } => Some(collection),
        }
    }
}

/// An ordered batch of [`PatchOp`]s, applied atomically by the receiver.
///
/// Built with chained calls:
///
/// ```rust
/// use studyroom_protocol::{FieldValue, StatePatch};
///
/// let patch = StatePatch::new()
///     .clear("players")
///     .field("width_units", FieldValue::Int(20));
/// assert_eq!(patch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePatch {
    pub ops: Vec<PatchOp>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.ops.push(PatchOp::Field {
            name: name.into(),
            value,
        });
        self
    }

    pub fn push(mut self, collection: impl Into<String>, record: Record) -> Self {
        self.ops.push(PatchOp::Push {
            collection: collection.into(),
            record,
        });
        self
    }

    pub fn put(
        mut self,
        collection: impl Into<String>,
        key: impl Into<String>,
        record: Record,
    ) -> Self {
        self.ops.push(PatchOp::Put {
            collection: collection.into(),
            key: key.into(),
            record,
        });
        self
    }

    pub fn delete(mut self, collection: impl Into<String>, key: impl Into<String>) -> Self {
        self.ops.push(PatchOp::Delete {
            collection: collection.into(),
            key: key.into(),
        });
        self
    }

    pub fn clear(mut self, collection: impl Into<String>) -> Self {
        self.ops.push(PatchOp::Clear {
            collection: collection.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_operation_order() {
        let patch = StatePatch::new()
            .clear("layout")
            .push("layout", Record::from_values(vec!["a".into()]))
            .delete("players", "p1");

        let collections: Vec<_> = patch.ops.iter().filter_map(PatchOp::collection).collect();
        assert_eq!(collections, ["layout", "layout", "players"]);
    }

    #[test]
    fn test_put_json_format() {
        let patch = StatePatch::new().put(
            "players",
            "abc",
            Record::from_values(vec!["abc".into(), FieldValue::Int(4)]),
        );
        let json = serde_json::to_value(&patch).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "ops": [{
                    "op": "put",
                    "collection": "players",
                    "key": "abc",
                    "record": ["abc", 4]
                }]
            })
        );
    }

    #[test]
    fn test_field_op_has_no_collection() {
        let patch = StatePatch::new().field("height_units", FieldValue::Int(15));
        assert_eq!(patch.ops[0].collection(), None);
        assert!(!patch.is_empty());
    }
}
