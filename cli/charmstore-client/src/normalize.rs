//! Recursive key normalization of catalog payloads.
//!
//! Catalog records use Go style keys (`Meta`, `Subordinate`, `charm-metadata`).
//! Consumers expect lower-cased keys throughout, with two twists:
//!
//! * arrays are turned into maps keyed by their stringified index,
//!   consumers address elements as `"0"`, `"1"`, ...
//! * one nesting level can be excluded from lower-casing, used for maps whose
//!   keys are identifiers rather than field names (e.g. config option names).
//!
//! Normalization never mutates its input, every call builds a fresh tree.
//! `serde_json::Value` is an owned tree, so cyclic input cannot be expressed.

use serde_json::{Map, Value};

/// 0-based nesting level whose keys keep their original casing.
///
/// Level 0 refers to the keys of the map passed to [lower_case_keys].
pub type ExcludeLevel = u32;

/// Normalize an optional value.
///
/// An absent source produces nothing. Objects are normalized recursively,
/// arrays become index-keyed maps and scalars are returned as they are.
pub fn normalize(source: Option<&Value>, exclude: Option<ExcludeLevel>) -> Option<Value> {
    source.map(|value| normalize_value(value, exclude))
}

/// Lower-case every key of `source`, recursively.
///
/// If two keys normalize to the same spelling, the one that comes later in
/// `source` wins.
pub fn lower_case_keys(source: &Map<String, Value>, exclude: Option<ExcludeLevel>) -> Map<String, Value> {
    let preserve_keys = exclude == Some(0);
    let child_exclude = descend(exclude);

    let mut normalized = Map::with_capacity(source.len());
    for (key, value) in source {
        let key = if preserve_keys {
            key.clone()
        } else {
            key.to_lowercase()
        };
        normalized.insert(key, normalize_value(value, child_exclude));
    }
    normalized
}

fn normalize_value(value: &Value, exclude: Option<ExcludeLevel>) -> Value {
    match value {
        Value::Object(map) => Value::Object(lower_case_keys(map, exclude)),
        Value::Array(items) => {
            let child_exclude = descend(exclude);
            Value::Object(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| (index.to_string(), normalize_value(item, child_exclude)))
                    .collect(),
            )
        },
        scalar => scalar.clone(),
    }
}

/// The exclude level as seen from one level deeper.
///
/// Once the excluded level has been passed there is nothing left to exclude.
fn descend(exclude: Option<ExcludeLevel>) -> Option<ExcludeLevel> {
    exclude.and_then(|level| level.checked_sub(1))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, found {other}"),
        }
    }

    #[test]
    fn lower_cases_nested_keys() {
        let source = as_map(json!({
            "Name": "mysql",
            "Provides": {"DB": {"Interface": "mysql", "Role": "provider"}},
            "bzr-owner": "charmers"
        }));
        assert_eq!(
            Value::Object(lower_case_keys(&source, None)),
            json!({
                "name": "mysql",
                "provides": {"db": {"interface": "mysql", "role": "provider"}},
                "bzr-owner": "charmers"
            })
        );
    }

    #[test]
    fn arrays_become_index_maps() {
        let source = as_map(json!({
            "Tags": ["database", "sql"],
            "Nested": [{"Key": [1, 2]}]
        }));
        assert_eq!(
            Value::Object(lower_case_keys(&source, None)),
            json!({
                "tags": {"0": "database", "1": "sql"},
                "nested": {"0": {"key": {"0": 1, "1": 2}}}
            })
        );
    }

    #[test]
    fn exclude_level_zero_preserves_top_level_keys() {
        let options = as_map(json!({
            "Dataset-Size": {"Type": "string", "Default": "80%"},
            "max_connections": {"Type": "int", "Default": -1}
        }));
        assert_eq!(
            Value::Object(lower_case_keys(&options, Some(0))),
            json!({
                "Dataset-Size": {"type": "string", "default": "80%"},
                "max_connections": {"type": "int", "default": -1}
            })
        );
    }

    #[test]
    fn exclude_applies_to_exactly_one_level() {
        let source = as_map(json!({
            "A": {"B": {"C": {"D": 1}}}
        }));
        assert_eq!(
            Value::Object(lower_case_keys(&source, Some(1))),
            json!({"a": {"B": {"c": {"d": 1}}}})
        );
    }

    #[test]
    fn index_map_counts_as_a_level() {
        let source = as_map(json!({"List": [{"Key": 1}]}));
        // level 0: "List", level 1: "0", level 2: "Key"
        assert_eq!(
            Value::Object(lower_case_keys(&source, Some(2))),
            json!({"list": {"0": {"Key": 1}}})
        );
    }

    #[test]
    fn already_lower_case_keys_are_kept() {
        let source = as_map(json!({"name": "x", "summary": "y"}));
        assert_eq!(lower_case_keys(&source, None), source);
    }

    #[test]
    fn later_key_wins_on_collision() {
        let source = as_map(json!({"Name": "first", "name": "second"}));
        assert_eq!(Value::Object(lower_case_keys(&source, None)), json!({"name": "second"}));
    }

    #[test]
    fn source_is_left_untouched() {
        let source = as_map(json!({"Meta": {"Tags": ["a"]}}));
        let before = source.clone();
        let _ = lower_case_keys(&source, None);
        assert_eq!(source, before);
    }

    #[test]
    fn absent_source_produces_nothing() {
        assert_eq!(normalize(None, None), None);
        assert_eq!(normalize(None, Some(0)), None);
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(normalize(Some(&json!(3)), None), Some(json!(3)));
        assert_eq!(normalize(Some(&Value::Null), None), Some(Value::Null));
    }

    fn arb_key() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9-]{0,8}"
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z -]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec((arb_key(), inner), 0..6)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    fn arb_map() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::vec((arb_key(), arb_json()), 0..6)
            .prop_map(|entries| entries.into_iter().collect())
    }

    fn all_keys_lower_case(value: &Value) -> bool {
        match value {
            Value::Object(map) => map
                .iter()
                .all(|(key, value)| *key == key.to_lowercase() && all_keys_lower_case(value)),
            Value::Array(items) => items.iter().all(all_keys_lower_case),
            _ => true,
        }
    }

    fn contains_array(value: &Value) -> bool {
        match value {
            Value::Object(map) => map.values().any(contains_array),
            Value::Array(_) => true,
            _ => false,
        }
    }

    proptest! {
        #[test]
        fn normalizing_is_idempotent(source in arb_map()) {
            let once = lower_case_keys(&source, None);
            let twice = lower_case_keys(&once, None);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_keys_are_lower_case(source in arb_map()) {
            let normalized = Value::Object(lower_case_keys(&source, None));
            prop_assert!(all_keys_lower_case(&normalized));
        }

        #[test]
        fn no_arrays_survive(source in arb_map()) {
            let normalized = Value::Object(lower_case_keys(&source, None));
            prop_assert!(!contains_array(&normalized));
        }

        #[test]
        fn excluded_level_keeps_keys(source in arb_map()) {
            let normalized = lower_case_keys(&source, Some(0));
            for key in source.keys() {
                prop_assert!(normalized.contains_key(key));
            }
        }
    }
}
