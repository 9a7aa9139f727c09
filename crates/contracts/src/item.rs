//! Item and Batch - the unit of work and its ordered container

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque unit of work.
///
/// The payload is carried through untouched; nothing downstream of decoding looks inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Value);

impl Item {
    /// Wrap an arbitrary JSON payload
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    /// Borrow the payload
    pub fn payload(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the payload
    pub fn into_payload(self) -> Value {
        self.0
    }
}

impl From<Value> for Item {
    fn from(payload: Value) -> Self {
        Self(payload)
    }
}

/// Ordered, finite sequence of items.
pub type Batch = Vec<Item>;

/// Build a batch of `len` payload-free items
pub fn blank_batch(len: usize) -> Batch {
    vec![Item::default(); len]
}
