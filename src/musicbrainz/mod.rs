//! Read-through cache over the MusicBrainz web service.
//!
//! By-ID and browse lookups consult the cache store first and only hit
//! the remote service on a miss; search results are never cached. A
//! 404 from the service is reported as `Ok(None)` by every cached
//! operation, absence being a valid outcome rather than an error.

pub mod client;
pub mod relationships;

use crate::cache::{CacheStore, DEFAULT_CACHE_EXPIRATION, prep_cache_key};
use crate::errors::MusicBrainzError;
use crate::models::{
    Artist, ArtistSearchResults, Release, ReleaseGroup, ReleaseGroupBrowseResults,
    ReleaseGroupSearchResults,
};
use client::{HttpLookupClient, LookupClient};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

// Server-side paging defaults, applied before keying so that an
// explicit default and an omitted parameter share a cache entry.
const DEFAULT_BROWSE_LIMIT: u32 = 25;
const DEFAULT_SEARCH_LIMIT: u32 = 25;

pub struct MusicBrainz<C = HttpLookupClient> {
    client: C,
    store: CacheStore,
}

impl MusicBrainz<HttpLookupClient> {
    /// The application name and version identify this client to the
    /// web service via the user-agent header.
    pub fn new(
        app_name: &str,
        app_version: &str,
        store: CacheStore,
    ) -> Result<Self, MusicBrainzError> {
        Ok(Self {
            client: HttpLookupClient::new(app_name, app_version)?,
            store,
        })
    }
}

impl<C: LookupClient> MusicBrainz<C> {
    pub fn with_client(client: C, store: CacheStore) -> Self {
        Self { client, store }
    }

    /// Get an artist by MBID, with relations grouped into
    /// `external_urls`. `Ok(None)` when no such artist exists.
    pub async fn artist_by_id(
        &self,
        mbid: &str,
        includes: &[&str],
    ) -> Result<Option<Artist>, MusicBrainzError> {
        let includes = normalized(includes);
        self.cached_lookup(
            "mb_artist",
            mbid,
            &includes,
            self.client.artist_by_id(mbid, &includes),
            relationships::process_artist,
        )
        .await
    }

    /// Get a release group by MBID, with relations grouped into
    /// `external_urls`. `Ok(None)` when no such release group exists.
    pub async fn release_group_by_id(
        &self,
        mbid: &str,
        includes: &[&str],
    ) -> Result<Option<ReleaseGroup>, MusicBrainzError> {
        let includes = normalized(includes);
        self.cached_lookup(
            "mb_release_group",
            mbid,
            &includes,
            self.client.release_group_by_id(mbid, &includes),
            relationships::process_release_group,
        )
        .await
    }

    /// Get a release by MBID, stored exactly as the service returned
    /// it. `Ok(None)` when no such release exists.
    pub async fn release_by_id(
        &self,
        mbid: &str,
        includes: &[&str],
    ) -> Result<Option<Release>, MusicBrainzError> {
        let includes = normalized(includes);
        self.cached_lookup(
            "mb_release",
            mbid,
            &includes,
            self.client.release_by_id(mbid, &includes),
            |release| release,
        )
        .await
    }

    /// Release group plus its credited artists, as shown on a review
    /// page.
    pub async fn release_group_details(
        &self,
        mbid: &str,
    ) -> Result<Option<ReleaseGroup>, MusicBrainzError> {
        self.release_group_by_id(mbid, &["artists"]).await
    }

    /// All release groups linked to an artist, one page at a time,
    /// optionally filtered by release type. `Ok(None)` when the artist
    /// does not exist.
    pub async fn browse_release_groups(
        &self,
        artist_mbid: &str,
        release_types: &[&str],
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Option<ReleaseGroupBrowseResults>, MusicBrainzError> {
        let release_types = normalized(release_types);
        let limit = limit.unwrap_or(DEFAULT_BROWSE_LIMIT);
        let offset = offset.unwrap_or(0);

        let mut params = vec![limit.to_string(), offset.to_string()];
        params.extend(release_types.iter().cloned());

        self.cached_lookup(
            "mb_browse_release_groups",
            artist_mbid,
            &params,
            self.client
                .browse_release_groups(artist_mbid, &release_types, limit, offset),
            |results| results,
        )
        .await
    }

    /// Search for artists by name, sort name or alias. Results are
    /// not cached.
    pub async fn search_artists(
        &self,
        query: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<ArtistSearchResults, MusicBrainzError> {
        self.client
            .search_artists(
                query,
                limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
                offset.unwrap_or(0),
            )
            .await
    }

    /// Search for release groups, optionally narrowed by artist or
    /// release group name. Results are not cached.
    pub async fn search_release_groups(
        &self,
        query: &str,
        artist: &str,
        release_group: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<ReleaseGroupSearchResults, MusicBrainzError> {
        self.client
            .search_release_groups(
                query,
                artist,
                release_group,
                limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
                offset.unwrap_or(0),
            )
            .await
    }

    /// One read-through shape for every cached operation: check the
    /// store, otherwise fetch, transform, store for 12 hours. The
    /// fetch future is only polled on a miss. A 404 yields `Ok(None)`
    /// and leaves the store untouched.
    async fn cached_lookup<T, Fut>(
        &self,
        prefix: &str,
        id: &str,
        params: &[String],
        fetch: Fut,
        transform: impl FnOnce(T) -> T,
    ) -> Result<Option<T>, MusicBrainzError>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<T, MusicBrainzError>>,
    {
        let key = prep_cache_key(prefix, id, params);
        if let Some(cached) = self.store.get(&key).await {
            debug!(%key, "cache hit");
            return Ok(Some(serde_json::from_str(&cached)?));
        }

        debug!(%key, "cache miss, fetching from MusicBrainz");
        let raw = match fetch.await {
            Ok(raw) => raw,
            Err(MusicBrainzError::Response { code: 404, .. }) => return Ok(None),
            Err(err) => return Err(err),
        };

        let value = transform(raw);
        self.store
            .set(&key, serde_json::to_string(&value)?, DEFAULT_CACHE_EXPIRATION)
            .await;
        Ok(Some(value))
    }
}

/// Sorted, deduplicated copy of an unordered parameter list, so call
/// order never changes the cache key.
fn normalized(values: &[&str]) -> Vec<String> {
    let mut values: Vec<String> = values.iter().map(|value| value.to_string()).collect();
    values.sort();
    values.dedup();
    values
}
