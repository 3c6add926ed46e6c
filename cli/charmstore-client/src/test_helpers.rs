//! Raw catalog records as returned by `meta/any`, for use in tests.

use serde_json::{Value, json};

/// A promulgated charm with config options, relations and a manifest.
pub fn charm_record() -> Value {
    json!({
        "Id": "cs:precise/mysql-38",
        "Meta": {
            "charm-metadata": {
                "Name": "mysql",
                "Summary": "MySQL is a fast, stable and true multi-user, multi-threaded SQL database",
                "Description": "MySQL is a fast, stable and true multi-user database server.",
                "Subordinate": false,
                "Provides": {
                    "db": {"Name": "db", "Role": "provider", "Interface": "mysql", "Optional": false, "Limit": 0, "Scope": "global"},
                    "Munin": {"Name": "munin", "Role": "provider", "Interface": "munin-node", "Optional": false, "Limit": 0, "Scope": "global"}
                },
                "Requires": {
                    "ceph": {"Name": "ceph", "Role": "requirer", "Interface": "ceph-client", "Optional": false, "Limit": 1, "Scope": "global"}
                },
                "Peers": {
                    "cluster": {"Name": "cluster", "Role": "peer", "Interface": "mysql-ha", "Optional": false, "Limit": 1, "Scope": "global"}
                },
                "Tags": ["databases", "sql"]
            },
            "charm-config": {
                "Options": {
                    "dataset-size": {"Type": "string", "Description": "How much data should be kept in memory", "Default": "80%"},
                    "Max-Connections": {"Type": "int", "Description": "Maximum connections to allow", "Default": -1}
                }
            },
            "charm-related": {
                "Provides": {
                    "mysql": [{"Id": "cs:precise/wordpress-24"}]
                }
            },
            "extra-info": {
                "bzr-owner": "charmers",
                "bzr-revisions": 38,
                "bzr-url": "lp:~charmers/charms/precise/mysql/trunk"
            },
            "manifest": [
                {"Name": "README.md", "Size": 1234},
                {"Name": "config.yaml", "Size": 321},
                {"Name": "hooks/install", "Size": 99}
            ],
            "stats": {
                "ArchiveDownloadCount": 1042
            }
        }
    })
}

/// A bundle owned by a user namespace, without a metadata name.
pub fn bundle_record() -> Value {
    json!({
        "Id": "cs:~alice/bundle/mediawiki-scalable-9",
        "Meta": {
            "bundle-metadata": {
                "Services": {
                    "mediawiki": {"Charm": "cs:precise/mediawiki-10", "NumUnits": 1},
                    "mysql": {"Charm": "cs:precise/mysql-28", "NumUnits": 1}
                },
                "Relations": [["mediawiki:db", "mysql:db"]],
                "Series": "precise"
            },
            "extra-info": {
                "bzr-owner": "alice",
                "bzr-revisions": 5,
                "bzr-url": "lp:~alice/charms/bundles/mediawiki-scalable/bundle"
            },
            "manifest": [
                {"Name": "bundle.yaml", "Size": 512},
                {"Name": "README.md", "Size": 64}
            ],
            "stats": {
                "ArchiveDownloadCount": 7
            }
        }
    })
}

/// A search response wrapping `records` in `Results`.
pub fn search_response(records: impl IntoIterator<Item = Value>) -> Value {
    json!({ "Results": records.into_iter().collect::<Vec<_>>() })
}

/// An `expand-id` response listing `ids`.
pub fn expand_id_response<'a>(ids: impl IntoIterator<Item = &'a str>) -> Value {
    Value::Array(ids.into_iter().map(|id| json!({ "Id": id })).collect())
}
