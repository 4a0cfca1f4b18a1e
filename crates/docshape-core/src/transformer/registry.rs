//! Named function registry
//!
//! Declarative rule sets refer to transforms by name. The registry is the
//! explicit lookup table consulted when those names are resolved; functions
//! are registered up front and never attached to shared types at runtime.
//!
//! Copyright (c) 2025 Docshape Team
//! Licensed under the Apache-2.0 license

use super::built_in;
use super::types::{DeriveFn, ValueFn};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Lookup table from function name to derive function
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, DeriveFn>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in function
    pub fn with_built_ins() -> Self {
        Self::new()
            .with("identity", built_in::identity())
            .with("to_string", built_in::to_string())
            .with("to_number", built_in::to_number())
            .with("to_boolean", built_in::to_boolean())
            .with("lowercase", built_in::lowercase())
            .with("uppercase", built_in::uppercase())
            .with("trim", built_in::trim())
            .with("split_comma", built_in::split_comma())
            .with("join_comma", built_in::join_comma())
            .with("length", built_in::length())
            .with("first", built_in::first())
            .with("wrap_list", built_in::wrap_list())
            .with("concat", built_in::concat())
            .with("split_name", built_in::split_name())
    }

    /// Register a function, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, function: DeriveFn) -> &mut Self {
        self.functions.insert(name.into(), function);
        self
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, name: impl Into<String>, function: DeriveFn) -> Self {
        self.register(name, function);
        self
    }

    /// Look up a derive function
    pub fn get(&self, name: &str) -> Result<DeriveFn> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownFunction {
                name: name.to_string(),
            })
    }

    /// Look up a function for update or lift.
    ///
    /// The returned function feeds one value in and requires exactly one
    /// value out.
    pub fn value_fn(&self, name: &str) -> Result<ValueFn> {
        let function = self.get(name)?;
        Ok(Arc::new(move |value| {
            let outputs = function(vec![value])?;
            let found = outputs.len();
            let [output] = <[_; 1]>::try_from(outputs)
                .map_err(|_| Error::ArityMismatch { expected: 1, found })?;
            Ok(output)
        }))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::derive::boxed;
    use serde_json::json;

    #[test]
    fn test_built_ins_registered() {
        let registry = FunctionRegistry::with_built_ins();
        assert_eq!(registry.len(), 14);
        assert!(registry.contains("split_name"));
        assert_eq!(registry.names().first(), Some(&"concat"));
    }

    #[test]
    fn test_unknown_function() {
        let registry = FunctionRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("nope"),
            Err(Error::UnknownFunction { ref name }) if name == "nope"
        ));
    }

    #[test]
    fn test_register_custom_function() {
        let mut registry = FunctionRegistry::new();
        registry.register("double", boxed(|values| Ok(json!(values[0].as_i64().unwrap_or(0) * 2))));
        let double = registry.value_fn("double").unwrap();
        assert_eq!(double(json!(21)).unwrap(), json!(42));
    }

    #[test]
    fn test_value_fn_rejects_multiple_outputs() {
        let registry = FunctionRegistry::with_built_ins();
        let split = registry.value_fn("split_name").unwrap();
        assert!(matches!(
            split(json!("Jane Doe")).unwrap_err(),
            Error::ArityMismatch { expected: 1, found: 2 }
        ));
    }
}
