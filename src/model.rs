//! Request and response bodies of the M2M JSON API.
//!
//! Field names follow the service's camelCase wire format. Lists the service may send as
//! `null` decode as empty.
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Credential issued by `login` and sent as `X-Auth-Token` on every later call.
#[derive(Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[derive(Serialize, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "filterType")]
pub enum SpatialFilter {
    /// Minimum bounding rectangle.
    #[serde(rename = "mbr", rename_all = "camelCase")]
    Mbr {
        lower_left: Coordinates,
        upper_right: Coordinates,
    },
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AcquisitionFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudCoverFilter {
    pub min: u8,
    pub max: u8,
    pub include_unknown: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneFilter {
    pub spatial_filter: SpatialFilter,
    pub acquisition_filter: AcquisitionFilter,
    pub cloud_cover_filter: CloudCoverFilter,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SceneSearchRequest<'a> {
    pub dataset_name: &'a str,
    pub scene_filter: SceneFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub entity_id: String,
    #[serde(default)]
    pub display_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SceneSearchResults {
    #[serde(default)]
    pub records_returned: u64,
    #[serde(default)]
    pub total_hits: Option<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<Scene>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOptionsRequest<'a> {
    pub dataset_name: &'a str,
    pub entity_ids: &'a [String],
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOption {
    pub id: String,
    pub entity_id: String,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub product_name: Option<String>,
}

/// A scene/product pair submitted in a download request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProduct {
    pub entity_id: String,
    pub product_id: String,
}

impl DownloadProduct {
    /// `None` unless the option is available for download.
    pub fn from_option(option: &DownloadOption) -> Option<Self> {
        if !option.available {
            return None;
        }
        Some(Self {
            entity_id: option.entity_id.clone(),
            product_id: option.id.clone(),
        })
    }
}

#[derive(Serialize, Debug)]
pub struct DownloadRequest<'a> {
    pub downloads: &'a [DownloadProduct],
    pub label: &'a str,
}

#[derive(Serialize, Debug)]
pub struct DownloadRetrieveRequest<'a> {
    pub label: &'a str,
}

/// Download identifier. The service sends these as numbers in some responses and as
/// strings in others, so both decode to the same value.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct DownloadId(String);

impl DownloadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DownloadId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// Set of download ids. Encoded by the service either as an object keyed by download id
/// or as an array; an empty set usually arrives as `[]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadIdSet(HashSet<DownloadId>);

impl DownloadIdSet {
    pub fn contains(&self, id: &DownloadId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<DownloadId> for DownloadIdSet {
    fn from_iter<I: IntoIterator<Item = DownloadId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for DownloadIdSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<DownloadId>),
            Keyed(HashMap<String, serde_json::Value>),
        }
        let ids = match Option::<Raw>::deserialize(deserializer)? {
            None => HashSet::new(),
            Some(Raw::List(ids)) => ids.into_iter().collect(),
            Some(Raw::Keyed(map)) => map.into_keys().map(DownloadId).collect(),
        };
        Ok(Self(ids))
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrl {
    pub download_id: DownloadId,
    #[serde(default)]
    pub url: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequestResults {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub available_downloads: Vec<DownloadUrl>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub preparing_downloads: Vec<DownloadUrl>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub failed: Vec<serde_json::Value>,
    #[serde(default)]
    pub new_records: DownloadIdSet,
    #[serde(default)]
    pub duplicate_products: DownloadIdSet,
}

impl DownloadRequestResults {
    /// Whether a retrieved download belongs to this request.
    pub fn tracks(&self, id: &DownloadId) -> bool {
        self.new_records.contains(id) || self.duplicate_products.contains(id)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DownloadRetrieveResults {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub available: Vec<DownloadUrl>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub requested: Vec<DownloadUrl>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
