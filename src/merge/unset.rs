//! Explicit field deletion
//!
//! Each path is resolved fresh against the current document. A path that
//! does not lead to an existing value is skipped, so unsetting is idempotent.
//! Removing a mapping key keeps the order of the remaining keys. A sequence
//! element is cleared to `null` in place rather than removed, so indexes stay
//! stable and the same path never reaches a different element.

use log::trace;
use serde_yaml::Value;

use super::{FieldPath, PathSegment};

/// Remove the value at each path in order.
pub fn unset(doc: &mut Value, paths: &[FieldPath]) {
    for path in paths {
        unset_path(doc, path);
    }
}

/// Remove the value at `path`. Returns whether anything was removed.
///
/// # Examples
///
/// ```
/// use manifest_customizer::merge::{parse_path, unset_path};
///
/// let mut doc: serde_yaml::Value =
///     serde_yaml::from_str("spec: {replicas: 1, resources: {cpu: 2}}").unwrap();
/// assert!(unset_path(&mut doc, &parse_path("spec.resources")));
/// assert!(!unset_path(&mut doc, &parse_path("spec.resources")));
/// assert_eq!(doc["spec"]["replicas"].as_u64(), Some(1));
/// ```
pub fn unset_path(doc: &mut Value, path: &[PathSegment]) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };

    let mut current = doc;
    for segment in parents {
        current = match child_mut(current, segment) {
            Some(child) => child,
            None => {
                trace!("Unset path {:?} does not resolve; skipping", path);
                return false;
            }
        };
    }
    remove_child(current, last)
}

fn child_mut<'a>(node: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match node {
        Value::Mapping(map) => map.get_mut(segment_key(segment).as_str()),
        Value::Sequence(seq) => segment_index(segment).and_then(move |idx| seq.get_mut(idx)),
        _ => None,
    }
}

fn remove_child(node: &mut Value, segment: &PathSegment) -> bool {
    match node {
        Value::Mapping(map) => {
            let key = segment_key(segment);
            if !map.contains_key(key.as_str()) {
                return false;
            }
            let entries = std::mem::take(map);
            *map = entries
                .into_iter()
                .filter(|(k, _)| k.as_str() != Some(key.as_str()))
                .collect();
            true
        }
        Value::Sequence(seq) => match segment_index(segment) {
            Some(idx) if idx < seq.len() && !seq[idx].is_null() => {
                seq[idx] = Value::Null;
                true
            }
            _ => false,
        },
        _ => false,
    }
}

fn segment_key(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Key(key) => key.clone(),
        PathSegment::Index(idx) => idx.to_string(),
    }
}

/// Numeric keys address sequence elements too, so `ports.0` and `ports[0]`
/// are equivalent.
fn segment_index(segment: &PathSegment) -> Option<usize> {
    match segment {
        PathSegment::Index(idx) => Some(*idx),
        PathSegment::Key(key) => key.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::parse_path;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn paths(list: &[&str]) -> Vec<FieldPath> {
        list.iter().map(|p| parse_path(p)).collect()
    }

    #[test]
    fn test_unset_is_idempotent() {
        let mut once = yaml("spec: {resources: {limits: {cpu: 1}}, replicas: 3}");
        unset(&mut once, &paths(&["spec.resources"]));
        let mut twice = once.clone();
        unset(&mut twice, &paths(&["spec.resources"]));
        assert_eq!(once, yaml("spec: {replicas: 3}"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unset_missing_path_is_noop() {
        let original = yaml("spec: {replicas: 3}");
        let mut doc = original.clone();
        unset(
            &mut doc,
            &paths(&["spec.resources", "status.phase", "spec.replicas.deeper", "spec[0]"]),
        );
        assert_eq!(doc, original);
    }

    #[test]
    fn test_unset_preserves_key_order() {
        let mut doc = yaml("a: 1\nb: 2\nc: 3");
        unset(&mut doc, &paths(&["b"]));
        let keys: Vec<&str> = doc
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_unset_sequence_element_by_index() {
        let mut doc = yaml("containers: [{name: a}, {name: b}, {name: c}]");
        unset(&mut doc, &paths(&["containers[1]"]));
        assert_eq!(doc, yaml("containers: [{name: a}, null, {name: c}]"));
    }

    #[test]
    fn test_unset_sequence_element_twice_is_noop() {
        let mut once = yaml("containers: [{name: a}, {name: b}, {name: c}]");
        assert!(unset_path(&mut once, &parse_path("containers[0]")));
        let mut twice = once.clone();
        assert!(!unset_path(&mut twice, &parse_path("containers[0]")));
        assert_eq!(twice, once);
        assert_eq!(once, yaml("containers: [null, {name: b}, {name: c}]"));
    }

    #[test]
    fn test_unset_null_elements_twice() {
        let mut once = yaml("a: [null, null, null]");
        unset(&mut once, &paths(&["a[0]"]));
        let mut twice = once.clone();
        unset(&mut twice, &paths(&["a[0]"]));
        assert_eq!(once, yaml("a: [null, null, null]"));
        assert_eq!(twice, once);
    }

    #[test]
    fn test_unset_numeric_key_on_sequence() {
        let mut doc = yaml("ports: [80, 443]");
        unset(&mut doc, &paths(&["ports.0"]));
        assert_eq!(doc, yaml("ports: [null, 443]"));
    }

    #[test]
    fn test_unset_inside_sequence_element() {
        let mut doc = yaml("containers: [{name: a, resources: {cpu: 1}}]");
        unset(&mut doc, &paths(&["containers[0].resources"]));
        assert_eq!(doc, yaml("containers: [{name: a}]"));
    }

    #[test]
    fn test_unset_paths_resolved_fresh() {
        // The second path runs against the document left by the first.
        let mut doc = yaml("items: [{name: a, port: 1}, {name: b}]");
        unset(&mut doc, &paths(&["items[0].port", "items[0].name", "items[1]"]));
        assert_eq!(doc, yaml("items: [{}, null]"));
    }

    #[test]
    fn test_unset_quoted_key() {
        let mut doc = yaml("data: {tls.crt: x, tls.key: y}");
        unset(&mut doc, &paths(&["data['tls.key']"]));
        assert_eq!(doc, yaml("data: {tls.crt: x}"));
    }

    #[test]
    fn test_unset_empty_path_is_noop() {
        let mut doc = yaml("a: 1");
        assert!(!unset_path(&mut doc, &[]));
        assert_eq!(doc, yaml("a: 1"));
    }
}
