//! Derivation of canonical [Entity] values from raw catalog records.
//!
//! A raw record is only read through a narrow schema covering the fields
//! that are actually used. Anything structurally unexpected along those paths
//! is a [ShapeError] rather than a silently missing field.

use derive_more::Display;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ShapeError;
use crate::normalize::lower_case_keys;
use crate::path::{PathBuilder, strip_scheme};

/// Marks an identifier in a user namespace, i.e. one that is not promulgated.
const USER_NAMESPACE_MARKER: char = '~';
const BUNDLE_MANIFEST_EXTENSION: &str = "/archive/bundle.yaml";

/// Metadata keys that would shadow a derived field.
const DERIVED_KEYS: &[&str] = &["id", "owner", "revisions", "downloads", "files"];
const CHARM_DERIVED_KEYS: &[&str] = &["options", "relations"];

// ---------------------------------------------------------------------------
// Wire schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Meta", default, deserialize_with = "object")]
    meta: Option<RawMeta>,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    #[serde(rename = "extra-info", default, deserialize_with = "object")]
    extra_info: Option<RawExtraInfo>,
    #[serde(rename = "charm-metadata")]
    charm_metadata: Option<Map<String, Value>>,
    #[serde(rename = "charm-config", default, deserialize_with = "object")]
    charm_config: Option<RawCharmConfig>,
    #[serde(rename = "bundle-metadata")]
    bundle_metadata: Option<Map<String, Value>>,
    #[serde(rename = "charm-related")]
    charm_related: Option<Map<String, Value>>,
    manifest: Option<Vec<Map<String, Value>>>,
    #[serde(default, deserialize_with = "object")]
    stats: Option<RawStats>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExtraInfo {
    #[serde(rename = "bzr-owner")]
    owner: Option<String>,
    #[serde(rename = "bzr-revisions")]
    revisions: Option<u64>,
    #[serde(rename = "bzr-url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCharmConfig {
    #[serde(rename = "Options")]
    options: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawStats {
    #[serde(rename = "ArchiveDownloadCount")]
    archive_download_count: Option<u64>,
}

/// Deserialize an optional nested struct from a JSON object only.
///
/// Derived struct impls also accept a sequence and fill fields by position.
fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Map<String, Value>>::deserialize(deserializer)? {
        Some(map) => T::deserialize(Value::Object(map))
            .map(Some)
            .map_err(de::Error::custom),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    #[display("charm")]
    Charm,
    #[display("bundle")]
    Bundle,
}

/// The canonical representation of a charm or bundle.
///
/// Serializes to a flat object: the fields below in camelCase, the
/// `entityType` tag with the type specific fields, and all remaining
/// normalized metadata (e.g. `description`, `tags`, `series`) at the top level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub revisions: Option<u64>,
    pub downloads: Option<u64>,
    pub code_source: CodeSource,
    pub is_approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_charms: Option<Map<String, Value>>,
    /// File names from the manifest, in catalog order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(flatten)]
    pub kind: EntityKind,
    /// Normalized charm or bundle metadata that has no dedicated field.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSource {
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entityType", rename_all = "lowercase")]
pub enum EntityKind {
    Charm(CharmDetails),
    Bundle(BundleDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharmDetails {
    /// Config options keyed by their verbatim option name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    pub relations: Relations,
    pub is_subordinate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Relations {
    pub provides: Map<String, Value>,
    pub requires: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDetails {
    /// Where the bundle's deployer file can be fetched from.
    pub deployer_file_url: String,
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        match self.kind {
            EntityKind::Charm(_) => EntityType::Charm,
            EntityKind::Bundle(_) => EntityType::Bundle,
        }
    }

    pub fn as_charm(&self) -> Option<&CharmDetails> {
        match &self.kind {
            EntityKind::Charm(charm) => Some(charm),
            EntityKind::Bundle(_) => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&BundleDetails> {
        match &self.kind {
            EntityKind::Bundle(bundle) => Some(bundle),
            EntityKind::Charm(_) => None,
        }
    }

    pub fn deployer_file_url(&self) -> Option<&str> {
        self.as_bundle()
            .map(|bundle| bundle.deployer_file_url.as_str())
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.get("description").and_then(Value::as_str)
    }

    pub fn summary(&self) -> Option<&str> {
        self.metadata.get("summary").and_then(Value::as_str)
    }

    /// Tags in catalog order.
    ///
    /// Normalization turned the tag list into an index-keyed map.
    pub fn tags(&self) -> Vec<&str> {
        self.metadata
            .get("tags")
            .and_then(Value::as_object)
            .map(|tags| tags.values().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// Turns raw catalog records into [Entity] values.
#[derive(Debug, Clone)]
pub struct EntityProcessor {
    paths: PathBuilder,
}

impl EntityProcessor {
    pub fn new(paths: PathBuilder) -> Self {
        Self { paths }
    }

    pub fn process(&self, record: &Value) -> Result<Entity, ShapeError> {
        if !record.is_object() {
            return Err(ShapeError::NotAnObject("catalog record"));
        }
        let RawRecord { id, meta } =
            RawRecord::deserialize(record).map_err(ShapeError::Malformed)?;
        let meta = meta.ok_or(ShapeError::MissingMeta)?;

        let (entity_type, raw_metadata) = match (meta.charm_metadata, meta.bundle_metadata) {
            (Some(charm), None) => (EntityType::Charm, charm),
            (None, Some(bundle)) => (EntityType::Bundle, bundle),
            (Some(_), Some(_)) => return Err(ShapeError::AmbiguousEntityType(id)),
            (None, None) => return Err(ShapeError::UnknownEntityType(id)),
        };
        trace!(%id, %entity_type, "processing catalog record");

        let extra_info = meta.extra_info.unwrap_or_default();

        let related_charms = meta
            .charm_related
            .as_ref()
            .map(|related| lower_case_keys(related, None));

        // Option names are identifiers, only their attributes are lower-cased.
        let options = match meta.charm_config.and_then(|config| config.options) {
            Some(Value::Object(options)) => Some(lower_case_keys(&options, Some(0))),
            _ => None,
        };

        let mut metadata = lower_case_keys(&raw_metadata, None);

        let name = match metadata.remove("name") {
            Some(Value::String(name)) if !name.is_empty() => name,
            None | Some(Value::Null) | Some(Value::String(_)) => name_from_id(&id),
            Some(_) => return Err(ShapeError::InvalidField("Name")),
        };

        let files = meta
            .manifest
            .map(|manifest| {
                manifest
                    .iter()
                    .map(manifest_file_name)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let kind = match entity_type {
            EntityType::Bundle => EntityKind::Bundle(BundleDetails {
                deployer_file_url: self.deployer_file_url(&id),
            }),
            EntityType::Charm => EntityKind::Charm(CharmDetails {
                options,
                relations: Relations {
                    provides: take_map(&mut metadata, "provides"),
                    requires: take_map(&mut metadata, "requires"),
                },
                is_subordinate: is_truthy(raw_metadata.get("Subordinate")),
            }),
        };

        let shadowed: &[&str] = match kind {
            EntityKind::Charm(_) => CHARM_DERIVED_KEYS,
            EntityKind::Bundle(_) => &[],
        };
        for key in DERIVED_KEYS.iter().chain(shadowed) {
            if metadata.remove(*key).is_some() {
                trace!(%id, key, "dropped metadata field shadowed by a derived field");
            }
        }

        Ok(Entity {
            is_approved: is_approved(&id),
            name,
            owner: extra_info.owner,
            revisions: extra_info.revisions,
            downloads: meta.stats.and_then(|stats| stats.archive_download_count),
            code_source: CodeSource {
                location: extra_info.url,
            },
            related_charms,
            files,
            kind,
            metadata,
            id,
        })
    }

    fn deployer_file_url(&self, id: &str) -> String {
        self.paths
            .build(&strip_scheme(id), None, Some(BUNDLE_MANIFEST_EXTENSION))
    }
}

/// An identifier with a user namespace marker past its first character has
/// not been promulgated.
pub fn is_approved(id: &str) -> bool {
    !matches!(id.find(USER_NAMESPACE_MARKER), Some(position) if position > 0)
}

/// Derive a name from the last path segment of an identifier,
/// dropping the trailing revision.
///
/// `cs:bundle/myapp-django-12` becomes `myapp-django`.
pub fn name_from_id(id: &str) -> String {
    let last_segment = id.rsplit('/').next().unwrap_or(id);
    let mut parts = last_segment.split('-').collect::<Vec<_>>();
    parts.pop();
    parts.join("-")
}

fn manifest_file_name(file: &Map<String, Value>) -> Result<String, ShapeError> {
    match lower_case_keys(file, None).remove("name") {
        Some(Value::String(name)) => Ok(name),
        _ => Err(ShapeError::MissingField("manifest entry name")),
    }
}

/// Remove `key` from `metadata`, defaulting to an empty map.
fn take_map(metadata: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match metadata.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(string)) => !string.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}
