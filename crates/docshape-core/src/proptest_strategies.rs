//! Property-based testing strategies for generating documents and paths
//!
//! Keys are drawn from a small alphabet so generated paths regularly hit
//! existing keys as well as absent ones.

#![cfg(test)]

use crate::path::Path;
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for generating mapping keys
pub fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

/// Strategy for generating scalar values
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::String),
    ]
}

/// Strategy for generating arbitrary nested values
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(Value::Array),
            btree_map(key_strategy(), inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Strategy for generating documents (mapping roots)
pub fn document_strategy() -> impl Strategy<Value = Value> {
    btree_map(key_strategy(), value_strategy(), 0..5)
        .prop_map(|entries| Value::Object(entries.into_iter().collect()))
}

/// Strategy for generating paths of one to three keys
pub fn path_strategy() -> impl Strategy<Value = Path> {
    vec(key_strategy(), 1..=3).prop_map(|keys| Path::try_from(keys).expect("non-empty keys"))
}

mod tests {
    use super::*;
    use crate::ops;
    use crate::transformer::batch;

    proptest! {
        #[test]
        fn optional_access_of_absent_path_is_skipped(
            doc in document_strategy(),
            path in path_strategy(),
        ) {
            prop_assume!(ops::get(&doc, &path).is_err());
            prop_assert_eq!(batch::get(&doc, &[path.clone()], true).unwrap(), vec![None]);

            let before = doc.clone();
            let mut doc = doc;
            prop_assert_eq!(batch::pop(&mut doc, &[path], true).unwrap(), vec![None]);
            prop_assert_eq!(doc, before);
        }
    }
}
