use crate::errors::MusicBrainzError;
use crate::models::{
    Artist, ArtistSearchResults, Release, ReleaseGroup, ReleaseGroupBrowseResults,
    ReleaseGroupSearchResults,
};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use urlencoding::encode;

const ROOT_URL: &str = "https://musicbrainz.org/ws/2";

/// By-ID fetch, search and browse operations against the MusicBrainz
/// web service. [`crate::musicbrainz::MusicBrainz`] layers the cache
/// on top of this.
pub trait LookupClient {
    async fn artist_by_id(
        &self,
        mbid: &str,
        includes: &[String],
    ) -> Result<Artist, MusicBrainzError>;

    async fn release_group_by_id(
        &self,
        mbid: &str,
        includes: &[String],
    ) -> Result<ReleaseGroup, MusicBrainzError>;

    async fn release_by_id(
        &self,
        mbid: &str,
        includes: &[String],
    ) -> Result<Release, MusicBrainzError>;

    async fn search_artists(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ArtistSearchResults, MusicBrainzError>;

    async fn search_release_groups(
        &self,
        query: &str,
        artist: &str,
        release_group: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ReleaseGroupSearchResults, MusicBrainzError>;

    async fn browse_release_groups(
        &self,
        artist_mbid: &str,
        release_types: &[String],
        limit: u32,
        offset: u32,
    ) -> Result<ReleaseGroupBrowseResults, MusicBrainzError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the MusicBrainz JSON web service.
///
/// The service requires callers to identify themselves, so the
/// user-agent is built from the application name and version handed in
/// at construction.
pub struct HttpLookupClient {
    client: Client,
    root_url: String,
}

impl HttpLookupClient {
    pub fn new(app_name: &str, app_version: &str) -> Result<Self, MusicBrainzError> {
        let client = Client::builder()
            .user_agent(format!("{app_name}/{app_version}"))
            .build()?;
        Ok(Self {
            client,
            root_url: ROOT_URL.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, MusicBrainzError> {
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            };
            return Err(MusicBrainzError::Response {
                code: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }

    fn entity_url(&self, entity: &str, mbid: &str, includes: &[String]) -> String {
        let mut url = format!("{}/{}/{}?fmt=json", self.root_url, entity, mbid);
        if !includes.is_empty() {
            url.push_str("&inc=");
            url.push_str(&includes.join("+"));
        }
        url
    }

    fn search_url(&self, entity: &str, query: &str, limit: u32, offset: u32) -> String {
        format!(
            "{}/{}?query={}&limit={}&offset={}&fmt=json",
            self.root_url,
            entity,
            encode(query),
            limit,
            offset
        )
    }
}

/// Lucene query matching artists by name, sort name or alias.
fn artist_query(query: &str) -> String {
    format!("artist:\"{query}\" OR sortname:\"{query}\" OR alias:\"{query}\"")
}

fn release_group_query(query: &str, artist: &str, release_group: &str) -> String {
    let mut terms = Vec::new();
    if !query.is_empty() {
        terms.push(query.to_string());
    }
    if !artist.is_empty() {
        terms.push(format!("artist:\"{artist}\""));
    }
    if !release_group.is_empty() {
        terms.push(format!("releasegroup:\"{release_group}\""));
    }
    terms.join(" AND ")
}

impl LookupClient for HttpLookupClient {
    async fn artist_by_id(
        &self,
        mbid: &str,
        includes: &[String],
    ) -> Result<Artist, MusicBrainzError> {
        self.get_json(self.entity_url("artist", mbid, includes)).await
    }

    async fn release_group_by_id(
        &self,
        mbid: &str,
        includes: &[String],
    ) -> Result<ReleaseGroup, MusicBrainzError> {
        self.get_json(self.entity_url("release-group", mbid, includes))
            .await
    }

    async fn release_by_id(
        &self,
        mbid: &str,
        includes: &[String],
    ) -> Result<Release, MusicBrainzError> {
        self.get_json(self.entity_url("release", mbid, includes)).await
    }

    async fn search_artists(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ArtistSearchResults, MusicBrainzError> {
        self.get_json(self.search_url("artist", &artist_query(query), limit, offset))
            .await
    }

    async fn search_release_groups(
        &self,
        query: &str,
        artist: &str,
        release_group: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ReleaseGroupSearchResults, MusicBrainzError> {
        let lucene = release_group_query(query, artist, release_group);
        self.get_json(self.search_url("release-group", &lucene, limit, offset))
            .await
    }

    async fn browse_release_groups(
        &self,
        artist_mbid: &str,
        release_types: &[String],
        limit: u32,
        offset: u32,
    ) -> Result<ReleaseGroupBrowseResults, MusicBrainzError> {
        let mut url = format!(
            "{}/release-group?artist={}&limit={}&offset={}&fmt=json",
            self.root_url, artist_mbid, limit, offset
        );
        if !release_types.is_empty() {
            url.push_str("&type=");
            url.push_str(&release_types.join("|"));
        }
        self.get_json(url).await
    }
}
