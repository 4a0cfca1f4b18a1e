//! Document utilities that never fail

use crate::path::Path;
use serde_json::Value;

pub use crate::transformer::batch::copy_all;
pub use crate::transformer::types::is_empty_value;

/// Key under which records collect their error entries
pub const ERRORS_KEY: &str = "errors";

/// Look up `path` without failing.
///
/// Returns `None` at the first missing key or at any node on the way that
/// is not a mapping.
pub fn query<'a>(doc: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(doc, |node, key| node.as_object()?.get(key))
}

/// Collect every entry of every `errors` array in the document.
///
/// Mappings are walked depth-first in key order. Sequences are not entered,
/// and an `errors` value that is not an array is collected as one entry.
pub fn get_all_errors(doc: &Value) -> Vec<Value> {
    let mut errors = Vec::new();
    collect_errors(doc, &mut errors);
    errors
}

fn collect_errors(node: &Value, errors: &mut Vec<Value>) {
    let Some(map) = node.as_object() else {
        return;
    };
    for (key, value) in map {
        if key == ERRORS_KEY {
            match value {
                Value::Array(items) => errors.extend(items.iter().cloned()),
                other => errors.push(other.clone()),
            }
        } else if value.is_object() {
            collect_errors(value, errors);
        }
    }
}
