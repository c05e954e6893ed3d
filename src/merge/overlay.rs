//! Deep merge of a partial patch onto a document
//!
//! Rules, applied recursively:
//!
//! - Mapping onto mapping: every patch key is merged into the target; keys
//!   only in the target are left alone, keys only in the patch are added.
//! - Sequence onto sequence: handled by the [`ArrayMergeMode`]. The default,
//!   [`ArrayMergeMode::ByKey`], merges elements by identity key when every
//!   element on both sides has one and replaces the target sequence wholesale
//!   otherwise.
//! - Anything else: the patch value replaces the target value, including an
//!   explicit `null`.
//!
//! A key missing from the patch never deletes anything; see
//! [`super::unset`] for deletion.

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// How two sequences at the same location are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayMergeMode {
    /// Merge elements sharing an identity key; replace the whole sequence
    /// when any element on either side has no key.
    #[default]
    ByKey,
    /// Always replace the target sequence with the patch sequence.
    Replace,
    /// Append the patch elements after the target elements.
    Append,
}

/// Merge `patch` into `target` with [`ArrayMergeMode::ByKey`].
///
/// # Examples
///
/// ```
/// use manifest_customizer::merge::merge;
///
/// let mut target: serde_yaml::Value = serde_yaml::from_str(
///     "containers: [{name: a, image: a:1}, {name: b, image: b:1}]",
/// ).unwrap();
/// let patch: serde_yaml::Value = serde_yaml::from_str(
///     "containers: [{name: b, image: b:2}]",
/// ).unwrap();
///
/// merge(&mut target, &patch);
/// assert_eq!(target["containers"][0]["image"].as_str(), Some("a:1"));
/// assert_eq!(target["containers"][1]["image"].as_str(), Some("b:2"));
/// ```
pub fn merge(target: &mut Value, patch: &Value) {
    merge_with(target, patch, ArrayMergeMode::ByKey);
}

/// Merge `patch` into `target` using the given sequence strategy.
pub fn merge_with(target: &mut Value, patch: &Value, mode: ArrayMergeMode) {
    merge_at(target, patch, mode, "");
}

/// The identity of a sequence element: its `name`, or else its
/// `metadata.name`.
///
/// Non-empty strings count as they are. Non-zero numbers and `true` count by
/// their string form, so `name: 7` and `name: "7"` share an identity. Empty
/// strings, zero, `false`, `null` and collections do not count.
pub fn identity_key(item: &Value) -> Option<String> {
    scalar_key(item.get("name"))
        .or_else(|| scalar_key(item.get("metadata").and_then(|m| m.get("name"))))
}

fn scalar_key(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()) => {
            Some(n.to_string())
        }
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn merge_at(target: &mut Value, patch: &Value, mode: ArrayMergeMode, path: &str) {
    match (target, patch) {
        (Value::Mapping(target_map), Value::Mapping(patch_map)) => {
            for (key, value) in patch_map {
                match target_map.get_mut(key) {
                    Some(existing) => merge_at(existing, value, mode, &child_path(path, key)),
                    None => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Sequence(target_seq), Value::Sequence(patch_seq)) => {
            merge_sequences(target_seq, patch_seq, mode, path);
        }
        (slot, value) => {
            trace!("Replacing value at '{}'", display_path(path));
            *slot = value.clone();
        }
    }
}

fn merge_sequences(target: &mut Vec<Value>, patch: &[Value], mode: ArrayMergeMode, path: &str) {
    match mode {
        ArrayMergeMode::Replace => *target = patch.to_vec(),
        ArrayMergeMode::Append => target.extend(patch.iter().cloned()),
        ArrayMergeMode::ByKey => match (identity_keys(target), identity_keys(patch)) {
            (Some(target_keys), Some(patch_keys)) => {
                merge_by_key(target, target_keys, patch, patch_keys, mode, path);
            }
            _ => {
                debug!(
                    "Sequence at '{}' has elements without identity keys; replacing {} elements with {}",
                    display_path(path),
                    target.len(),
                    patch.len()
                );
                *target = patch.to_vec();
            }
        },
    }
}

/// Keys for every element, or `None` if any element has none.
fn identity_keys(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(identity_key)
        .collect()
}

fn merge_by_key(
    target: &mut Vec<Value>,
    target_keys: Vec<String>,
    patch: &[Value],
    patch_keys: Vec<String>,
    mode: ArrayMergeMode,
    path: &str,
) {
    // Duplicate keys on either side collapse into the first slot, holding the
    // last element seen for that key.
    let mut slots: Vec<Value> = Vec::with_capacity(target.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for (key, item) in target_keys.into_iter().zip(target.drain(..)) {
        match index.get(&key) {
            Some(&at) => slots[at] = item,
            None => {
                index.insert(key, slots.len());
                slots.push(item);
            }
        }
    }

    let mut incoming: Vec<(String, &Value)> = Vec::with_capacity(patch.len());
    for (key, item) in patch_keys.into_iter().zip(patch) {
        match incoming.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = item,
            None => incoming.push((key, item)),
        }
    }

    for (key, item) in incoming {
        match index.get(&key) {
            Some(&at) => merge_at(&mut slots[at], item, mode, &format!("{}[{}]", path, key)),
            None => {
                index.insert(key, slots.len());
                slots.push(item.clone());
            }
        }
    }

    *target = slots;
}

fn child_path(path: &str, key: &Value) -> String {
    let key = match key {
        Value::String(s) => s.clone(),
        other => format!("{:?}", other),
    };
    if path.is_empty() {
        key
    } else {
        format!("{}.{}", path, key)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}
