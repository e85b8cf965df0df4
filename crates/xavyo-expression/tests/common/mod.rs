//! Shared helpers for expression integration tests.

#![allow(dead_code)]

use xavyo_delta::{ItemDelta, ItemPath, Value};
use xavyo_expression::Source;

pub fn path(p: &str) -> ItemPath {
    p.parse().expect("valid path")
}

/// Source whose values change from `old` to `new`.
pub fn changing_source(name: &str, old: Vec<Value>, new: Vec<Value>) -> Source {
    Source {
        name: name.to_string(),
        path: path(name),
        old_values: old,
        delta: Some(ItemDelta::replace(path(name), new)),
    }
}

/// Boolean source flipping from `old` to `new`.
pub fn flag(name: &str, old: bool, new: bool) -> Source {
    changing_source(name, vec![Value::Bool(old)], vec![Value::Bool(new)])
}
