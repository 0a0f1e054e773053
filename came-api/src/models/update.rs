//! Status-update list handling

use std::ops::Deref;

use serde_json::Value;

/// Chronological list of raw status updates from a `status_update_req`
/// response
///
/// Updates are kept as raw JSON objects: their shape varies by device type
/// and consumers match on the fields they care about. Derefs to a slice.
#[derive(Debug, Clone, Default)]
pub struct UpdateList {
    updates: Vec<Value>,
}

impl UpdateList {
    /// Extract the update list from a decoded response
    ///
    /// A response without a `result` key yields an empty list.
    pub(crate) fn from_response(response: &Value) -> Self {
        Self {
            updates: response
                .get("result")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl Deref for UpdateList {
    type Target = [Value];

    fn deref(&self) -> &Self::Target {
        &self.updates
    }
}

impl<'a> IntoIterator for &'a UpdateList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.iter()
    }
}
