use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// URLs gathered from an entity's relations, grouped by relation type.
pub type ExternalUrls = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeSpan {
    #[serde(default)]
    pub begin: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub ended: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationUrl {
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "type")]
    pub relation_type: String,
    #[serde(default)]
    pub url: Option<RelationUrl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(rename = "sort-name", default)]
    pub sort_name: Option<String>,
    #[serde(rename = "type", default)]
    pub artist_type: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(rename = "life-span", default)]
    pub life_span: Option<LifeSpan>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    /// Populated by relationship processing, not by the web service.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditedArtist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistCredit {
    pub name: String,
    #[serde(default)]
    pub artist: Option<CreditedArtist>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseGroup {
    pub id: String,
    pub title: String,
    #[serde(rename = "primary-type", default)]
    pub primary_type: Option<String>,
    #[serde(rename = "first-release-date", default)]
    pub first_release_date: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    /// Populated by relationship processing, not by the web service.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(rename = "track-count", default)]
    pub track_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    pub media: Vec<Medium>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistSearchResults {
    pub count: u32,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseGroupSearchResults {
    pub count: u32,
    #[serde(rename = "release-groups", default)]
    pub release_groups: Vec<ReleaseGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseGroupBrowseResults {
    #[serde(rename = "release-group-count")]
    pub count: u32,
    #[serde(rename = "release-groups", default)]
    pub release_groups: Vec<ReleaseGroup>,
}
