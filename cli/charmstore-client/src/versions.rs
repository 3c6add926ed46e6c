//! Listing the revisions of a charm that share its series.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ShapeError;
use crate::path::strip_scheme;

/// One entry of an `expand-id` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpandedId {
    #[serde(rename = "Id")]
    pub id: String,
}

/// Parse an `expand-id` response body.
///
/// Every entry has to be an object, positional entries are rejected.
pub fn parse_expanded_ids(body: Value) -> Result<Vec<ExpandedId>, ShapeError> {
    let entries: Vec<Map<String, Value>> =
        serde_json::from_value(body).map_err(ShapeError::Malformed)?;
    entries
        .into_iter()
        .map(|entry| ExpandedId::deserialize(Value::Object(entry)).map_err(ShapeError::Malformed))
        .collect()
}

/// The series of a charm, i.e. the first path segment of its scheme-less id.
///
/// Ids in a user namespace yield the namespace (`~alice`) rather than
/// a series.
pub fn series_of(charm_id: &str) -> String {
    let id = strip_scheme(charm_id);
    match id.split_once('/') {
        Some((series, _)) => series.to_string(),
        None => id,
    }
}

/// Keep the ids containing `series`, in catalog order.
pub fn filter_versions(series: &str, expanded: &[ExpandedId]) -> Vec<String> {
    expanded
        .iter()
        .filter(|entry| entry.id.contains(series))
        .map(|entry| entry.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::test_helpers::expand_id_response;

    #[test]
    fn series_is_first_segment() {
        assert_eq!(series_of("cs:trusty/mysql-5"), "trusty");
        assert_eq!(series_of("trusty/mysql-5"), "trusty");
        assert_eq!(series_of("cs:mysql"), "mysql");
        assert_eq!(series_of("cs:~alice/trusty/mysql-5"), "~alice");
    }

    #[test]
    fn keeps_matching_series_in_order() {
        let expanded = parse_expanded_ids(expand_id_response([
            "cs:trusty/mysql-6",
            "cs:xenial/mysql-1",
            "cs:trusty/mysql-5",
        ]))
        .unwrap();

        assert_eq!(filter_versions("trusty", &expanded), vec![
            "cs:trusty/mysql-6",
            "cs:trusty/mysql-5"
        ]);
    }

    #[test]
    fn no_matches_is_empty() {
        let expanded = parse_expanded_ids(expand_id_response(["cs:xenial/mysql-1"])).unwrap();
        assert!(filter_versions("trusty", &expanded).is_empty());
    }

    #[test]
    fn entries_without_id_are_malformed() {
        let err = parse_expanded_ids(json!([{"Id": "cs:trusty/mysql-5"}, {"Name": "x"}])).unwrap_err();
        assert!(matches!(err, ShapeError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn positional_entries_are_malformed() {
        let err = parse_expanded_ids(json!([["cs:trusty/mysql-5"]])).unwrap_err();
        assert!(matches!(err, ShapeError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn non_list_is_malformed() {
        let err = parse_expanded_ids(json!({"Id": "cs:trusty/mysql-5"})).unwrap_err();
        assert!(matches!(err, ShapeError::Malformed(_)), "{err:?}");
    }
}
