//! Attribute layers and how they combine.
//!
//! A node carries four independent layers. The effective value of a key is
//! taken from the highest layer that defines it, merging nested maps key by
//! key rather than replacing whole subtrees.

use ridley_api::errors::ChefError;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub type Attributes = HashMap<String, Value>;

/// Attribute layers, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Automatic,
    Default,
    Normal,
    Override,
}

impl Precedence {
    pub fn ascending() -> [Precedence; 4] {
        [
            Precedence::Automatic,
            Precedence::Default,
            Precedence::Normal,
            Precedence::Override,
        ]
    }
}

/// Merge `overlay` into `base`. Maps merge per key; any other value in
/// `overlay` replaces what `base` had.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => merge_object(base, overlay),
        (base, overlay) => *base = overlay.clone(),
    }
}

fn merge_object(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (k, v) in overlay {
        match base.get_mut(k) {
            Some(existing) => deep_merge(existing, v),
            None => {
                base.insert(k.clone(), v.clone());
            }
        }
    }
}

pub fn merge_into(base: &mut Attributes, overlay: &Attributes) {
    for (k, v) in overlay {
        match base.get_mut(k) {
            Some(existing) => deep_merge(existing, v),
            None => {
                base.insert(k.clone(), v.clone());
            }
        }
    }
}

/// Merge layers given lowest precedence first. The inputs are never
/// modified; the result shares no storage with them.
pub fn merge_layers(layers: &[&Attributes]) -> Attributes {
    let mut merged = Attributes::new();
    for layer in layers {
        merge_into(&mut merged, layer);
    }
    merged
}

/// Find a value by dotted path, e.g. `cloud.public_ipv4`.
pub fn lookup<'a>(attrs: &'a Attributes, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = attrs.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Set a value by dotted path, creating intermediate maps as needed and
/// replacing any non-map value found along the way.
pub fn set_path(attrs: &mut Attributes, path: &str, value: Value) -> Result<(), ChefError> {
    let invalid = || ChefError::Validation(format!("invalid attribute path '{}'", path));
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }
    let (last, parents) = parts.split_last().ok_or_else(invalid)?;
    if parents.is_empty() {
        attrs.insert((*last).to_owned(), value);
        return Ok(());
    }

    let mut current = attrs
        .entry(parents[0].to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    for part in &parents[1..] {
        current = object_mut(current)
            .entry((*part).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    object_mut(current).insert((*last).to_owned(), value);
    Ok(())
}

fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            *other = Value::Object(Map::new());
            object_mut(other)
        }
    }
}
