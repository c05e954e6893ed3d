//! Accessors over untyped resource documents.
//!
//! A document is a `serde_yaml::Value` tree. Nothing here validates it against
//! a resource schema; helpers return `None` when a field is missing or has an
//! unexpected type, and the `_mut` helpers create intermediate mappings on
//! demand.

use serde_yaml::{Mapping, Value};

/// One resource manifest.
pub type Document = Value;

/// `metadata.name`, if present and a string.
pub fn name(doc: &Document) -> Option<&str> {
    doc.get("metadata")?.get("name")?.as_str()
}

/// Top-level `kind`, if present and a string.
pub fn kind(doc: &Document) -> Option<&str> {
    doc.get("kind")?.as_str()
}

/// `metadata.namespace`, if present and a string.
pub fn namespace(doc: &Document) -> Option<&str> {
    doc.get("metadata")?.get("namespace")?.as_str()
}

/// Follow a chain of mapping keys.
pub fn get_path<'a>(doc: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(doc, |current, key| current.get(*key))
}

/// Follow a chain of mapping keys mutably, without creating anything.
pub fn get_path_mut<'a>(doc: &'a mut Value, keys: &[&str]) -> Option<&'a mut Value> {
    keys.iter()
        .try_fold(doc, |current, key| current.get_mut(*key))
}

/// Coerce `value` into a mapping, replacing any non-mapping content.
pub fn ensure_mapping(value: &mut Value) -> &mut Mapping {
    if !value.is_mapping() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(map) => map,
        _ => unreachable!("value was just replaced with a mapping"),
    }
}

/// Coerce `value` into a sequence, replacing any non-sequence content.
pub fn ensure_sequence(value: &mut Value) -> &mut Vec<Value> {
    if !value.is_sequence() {
        *value = Value::Sequence(Vec::new());
    }
    match value {
        Value::Sequence(seq) => seq,
        _ => unreachable!("value was just replaced with a sequence"),
    }
}

/// Walk `keys` from `doc`, creating mappings for missing or non-mapping
/// intermediate nodes, and return the final slot (`Null` if newly created).
pub fn path_entry<'a>(doc: &'a mut Value, keys: &[&str]) -> &'a mut Value {
    keys.iter().fold(doc, |current, key| {
        ensure_mapping(current)
            .entry(Value::from(*key))
            .or_insert(Value::Null)
    })
}

/// Set a string field, creating the path to it.
pub fn set_string(doc: &mut Value, keys: &[&str], value: &str) {
    *path_entry(doc, keys) = Value::from(value);
}

/// Remove a mapping key, keeping the order of the remaining keys. Returns
/// whether the key was present.
pub fn remove_key(value: &mut Value, key: &str) -> bool {
    let Value::Mapping(map) = value else {
        return false;
    };
    if !map.contains_key(key) {
        return false;
    }
    let entries = std::mem::take(map);
    *map = entries
        .into_iter()
        .filter(|(k, _)| k.as_str() != Some(key))
        .collect();
    true
}

/// The pod spec of a workload (`spec.template.spec`), if present.
pub fn pod_spec_mut(doc: &mut Document) -> Option<&mut Value> {
    get_path_mut(doc, &["spec", "template", "spec"])
}

/// Containers of a workload's pod template. Missing or malformed lists yield
/// an empty result.
pub fn containers_mut(doc: &mut Document) -> Vec<&mut Value> {
    list_in_pod_spec(doc, &["containers"])
}

/// Containers followed by init containers of a workload's pod template.
pub fn all_containers_mut(doc: &mut Document) -> Vec<&mut Value> {
    list_in_pod_spec(doc, &["containers", "initContainers"])
}

fn list_in_pod_spec<'a>(doc: &'a mut Document, fields: &[&str]) -> Vec<&'a mut Value> {
    let Some(Value::Mapping(pod_spec)) = pod_spec_mut(doc) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    // Iterate the mapping once so each list is borrowed disjointly.
    for (key, value) in pod_spec.iter_mut() {
        let wanted = key.as_str().is_some_and(|k| fields.contains(&k));
        if let (true, Value::Sequence(items)) = (wanted, value) {
            out.push((key.as_str().unwrap_or_default().to_string(), items));
        }
    }
    out.sort_by_key(|(key, _)| fields.iter().position(|f| f == key));
    out.into_iter().flat_map(|(_, items)| items.iter_mut()).collect()
}
