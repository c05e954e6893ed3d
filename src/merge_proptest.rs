//! Property-based tests for the overlay merge engine.
//!
//! These tests use proptest to generate random document trees and verify
//! that merge and unset invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::merge::{merge, parse_path, unset};
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::from),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        arb_scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
                prop::collection::vec(("[a-d]", inner), 0..4).prop_map(|pairs| {
                    Value::Mapping(
                        pairs
                            .into_iter()
                            .map(|(k, v)| (Value::from(k), v))
                            .collect::<Mapping>(),
                    )
                }),
            ]
        })
    }

    fn arb_mapping() -> impl Strategy<Value = Value> {
        prop::collection::vec(("[a-d]", arb_value()), 0..5).prop_map(|pairs| {
            Value::Mapping(
                pairs
                    .into_iter()
                    .map(|(k, v)| (Value::from(k), v))
                    .collect::<Mapping>(),
            )
        })
    }

    fn named(names: &[String]) -> Value {
        Value::Sequence(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    let mut m = Mapping::new();
                    m.insert(Value::from("name"), Value::from(n.as_str()));
                    m.insert(Value::from("v"), Value::from(i as u64));
                    Value::Mapping(m)
                })
                .collect(),
        )
    }

    fn unique_in_order<'a>(names: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for n in names {
            if !out.contains(n) {
                out.push(n.clone());
            }
        }
        out
    }

    proptest! {
        /// Property: merging an empty patch leaves any document unchanged
        #[test]
        fn merge_empty_patch_is_identity(doc in arb_mapping()) {
            let mut merged = doc.clone();
            merge(&mut merged, &Value::Mapping(Mapping::new()));
            prop_assert_eq!(merged, doc);
        }

        /// Property: applying the same patch twice equals applying it once
        #[test]
        fn merge_is_idempotent(target in arb_mapping(), patch in arb_mapping()) {
            let mut once = target.clone();
            merge(&mut once, &patch);
            let mut twice = once.clone();
            merge(&mut twice, &patch);
            prop_assert_eq!(twice, once);
        }

        /// Property: keys only present in the target survive the merge
        #[test]
        fn merge_never_deletes_target_keys(target in arb_mapping(), patch in arb_mapping()) {
            let mut merged = target.clone();
            merge(&mut merged, &patch);
            let merged_map = merged.as_mapping().unwrap();
            for (key, value) in target.as_mapping().unwrap() {
                prop_assert!(merged_map.contains_key(key));
                if !patch.as_mapping().unwrap().contains_key(key) {
                    prop_assert_eq!(&merged_map[key], value);
                }
            }
        }

        /// Property: named elements keep target order, new names follow in
        /// patch order, and patched elements carry the last patch value
        #[test]
        fn keyed_sequences_merge_by_name(
            target in prop::collection::vec("[a-f]", 0..6),
            patch in prop::collection::vec("[a-f]", 1..6),
        ) {
            let mut merged = named(&target);
            merge(&mut merged, &named(&patch));

            let mut expected = unique_in_order(&target);
            for n in unique_in_order(&patch) {
                if !expected.contains(&n) {
                    expected.push(n);
                }
            }
            let elements = merged.as_sequence().unwrap();
            let got: Vec<String> = elements
                .iter()
                .map(|e| e["name"].as_str().unwrap().to_string())
                .collect();
            prop_assert_eq!(&got, &expected);

            for element in elements {
                let name = element["name"].as_str().unwrap();
                if let Some(last) = patch.iter().rposition(|n| n == name) {
                    prop_assert_eq!(element["v"].as_u64(), Some(last as u64));
                }
            }
        }

        /// Property: unsetting a path twice equals unsetting it once
        #[test]
        fn unset_is_idempotent(
            doc in arb_mapping(),
            path in "[a-d](\\.[a-d]|\\[[0-2]\\]){0,3}",
        ) {
            let paths = vec![parse_path(&path)];
            let mut once = doc.clone();
            unset(&mut once, &paths);
            let mut twice = once.clone();
            unset(&mut twice, &paths);
            prop_assert_eq!(twice, once);
        }

        /// Property: parse_path never yields empty key segments
        #[test]
        fn parse_path_has_no_empty_keys(path in ".*") {
            for segment in parse_path(&path) {
                if let crate::merge::PathSegment::Key(key) = segment {
                    prop_assert!(!key.is_empty());
                }
            }
        }
    }
}
