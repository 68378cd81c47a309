//! Helper functions for extracting values from KDL nodes.

use crate::{ConfigError, ConfigResult};
use kdl::{KdlNode, KdlValue};
use std::collections::BTreeMap;

pub(crate) fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

pub(crate) fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

/// Read a non-negative integer property.
pub(crate) fn get_index_prop(node: &KdlNode, name: &str) -> ConfigResult<Option<usize>> {
    let Some(value) = node.get(name) else {
        return Ok(None);
    };
    value
        .as_integer()
        .and_then(|i| usize::try_from(i).ok())
        .map(Some)
        .ok_or_else(|| ConfigError::InvalidValue {
            field: name.to_string(),
            message: format!("expected a non-negative integer, found {}", value),
        })
}

/// The node's first argument, or a `MissingField` error describing `what`.
pub(crate) fn require_name(node: &KdlNode, what: &str) -> ConfigResult<String> {
    get_first_string_arg(node).ok_or_else(|| ConfigError::MissingField(what.to_string()))
}

/// Collect `KEY "value"` children into a map, e.g. for `env { ... }` blocks.
pub(crate) fn get_child_map(node: &KdlNode) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value().to_string();
            if let Some(val) = child
                .entries()
                .iter()
                .find(|e| e.name().is_none())
                .map(|e| scalar_to_string(e.value()))
            {
                map.insert(key, val);
            }
        }
    }
    map
}

fn scalar_to_string(value: &KdlValue) -> String {
    if let Some(s) = value.as_string() {
        s.to_string()
    } else if let Some(i) = value.as_integer() {
        i.to_string()
    } else if let Some(b) = value.as_bool() {
        b.to_string()
    } else {
        value.to_string()
    }
}
