//! Built-in transform functions
//!
//! Pre-configured derive functions for common normalization steps: type
//! coercions, string cleanup, list splitting and name splitting. They are
//! registered by name in [`FunctionRegistry::with_built_ins`](super::registry::FunctionRegistry::with_built_ins).
//!
//! Copyright (c) 2025 Docshape Team
//! Licensed under the Apache-2.0 license

use super::derive::{boxed, unary};
use super::types::{derive_fn, DeriveFn};
use crate::error::{value_kind, Error, Result};
use serde_json::{Number, Value};

fn expect_str<'a>(value: &'a Value, function: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        Error::transform(format!(
            "{} expects a string, found {}: {}",
            function,
            value_kind(value),
            value
        ))
    })
}

/// Pass every source value through unchanged (N values in, N out)
pub fn identity() -> DeriveFn {
    derive_fn(Ok)
}

/// Render scalars as strings; `null` stays `null`
pub fn to_string() -> DeriveFn {
    unary(|value| {
        Ok(match value {
            Value::Null => Value::Null,
            Value::String(s) => Value::String(s),
            Value::Bool(b) => Value::String(b.to_string()),
            Value::Number(n) => Value::String(n.to_string()),
            other => Value::String(serde_json::to_string(&other)?),
        })
    })
}

/// Parse numeric strings; integers stay integers
pub fn to_number() -> DeriveFn {
    unary(|value| match value {
        Value::Number(n) => Ok(Value::Number(n)),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::Number(Number::from(i)));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| Error::transform(format!("cannot convert {:?} to a number", s)))
        }
        other => Err(Error::transform(format!(
            "cannot convert {} to a number: {}",
            value_kind(&other),
            other
        ))),
    })
}

/// Parse yes/no style strings into booleans
pub fn to_boolean() -> DeriveFn {
    unary(|value| match value {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "on" => Ok(Value::Bool(true)),
            "false" | "no" | "n" | "0" | "off" => Ok(Value::Bool(false)),
            _ => Err(Error::transform(format!("cannot convert {:?} to a boolean", s))),
        },
        other => Err(Error::transform(format!(
            "cannot convert {} to a boolean: {}",
            value_kind(&other),
            other
        ))),
    })
}

pub fn lowercase() -> DeriveFn {
    unary(|value| Ok(Value::String(expect_str(&value, "lowercase")?.to_lowercase())))
}

pub fn uppercase() -> DeriveFn {
    unary(|value| Ok(Value::String(expect_str(&value, "uppercase")?.to_uppercase())))
}

pub fn trim() -> DeriveFn {
    unary(|value| Ok(Value::String(expect_str(&value, "trim")?.trim().to_string())))
}

/// Split a comma separated string into a list of trimmed, non-empty items
pub fn split_comma() -> DeriveFn {
    unary(|value| {
        let items = expect_str(&value, "split_comma")?
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect();
        Ok(Value::Array(items))
    })
}

/// Join a list of scalars with `", "`
pub fn join_comma() -> DeriveFn {
    unary(|value| {
        let items = value
            .as_array()
            .ok_or_else(|| Error::transform(format!("join_comma expects an array, found {}", value_kind(&value))))?;
        let parts = items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>();
        Ok(Value::String(parts.join(", ")))
    })
}

/// Length of a string (in characters), list or mapping
pub fn length() -> DeriveFn {
    unary(|value| {
        let len = match &value {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            other => {
                return Err(Error::transform(format!("length of {} is undefined", value_kind(other))));
            }
        };
        Ok(Value::Number(Number::from(len)))
    })
}

/// First element of a list, `null` for an empty list; non-lists pass through
pub fn first() -> DeriveFn {
    unary(|value| match value {
        Value::Array(items) => Ok(items.into_iter().next().unwrap_or(Value::Null)),
        other => Ok(other),
    })
}

/// Wrap a non-list value in a one-element list
pub fn wrap_list() -> DeriveFn {
    unary(|value| match value {
        Value::Array(items) => Ok(Value::Array(items)),
        other => Ok(Value::Array(vec![other])),
    })
}

/// Join all non-empty source values with a single space
pub fn concat() -> DeriveFn {
    boxed(|values| {
        let parts: Vec<String> = values
            .into_iter()
            .filter(|value| !super::types::is_empty_value(value))
            .map(|value| match value {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        Ok(Value::String(parts.join(" ")))
    })
}

/// Split a person's name into `(first, last)`.
///
/// Accepts `"Last, First"` and `"First Middle Last"`; a single word becomes
/// the first name with a `null` last name.
pub fn split_name() -> DeriveFn {
    derive_fn(|values| {
        let found = values.len();
        let [value] = <[Value; 1]>::try_from(values)
            .map_err(|_| Error::ArityMismatch { expected: 1, found })?;
        let name = expect_str(&value, "split_name")?.trim();

        let (first, last) = match name.split_once(',') {
            Some((last, first)) => (first.trim(), Some(last.trim())),
            None => match name.rsplit_once(char::is_whitespace) {
                Some((first, last)) => (first.trim(), Some(last.trim())),
                None => (name, None),
            },
        };

        Ok(vec![
            Value::String(first.to_string()),
            last.map(|l| Value::String(l.to_string())).unwrap_or(Value::Null),
        ])
    })
}
