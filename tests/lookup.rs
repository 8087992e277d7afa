use std::sync::{Arc, Mutex};
use tunecrit::cache::CacheStore;
use tunecrit::errors::MusicBrainzError;
use tunecrit::models::{
    Artist, ArtistCredit, ArtistSearchResults, CreditedArtist, Medium, Relation, RelationUrl,
    Release, ReleaseGroup, ReleaseGroupBrowseResults, ReleaseGroupSearchResults,
};
use tunecrit::musicbrainz::MusicBrainz;
use tunecrit::musicbrainz::client::LookupClient;

/// Stands in for the web service: hands back canned entities, or a
/// scripted error, and records every remote call it receives.
#[derive(Clone)]
struct FakeClient {
    calls: Arc<Mutex<Vec<String>>>,
    error: Option<(u16, &'static str)>,
}

impl FakeClient {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    fn failing(code: u16, message: &'static str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            error: Some((code, message)),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn fail_if_scripted(&self) -> Result<(), MusicBrainzError> {
        match self.error {
            Some((code, message)) => Err(MusicBrainzError::Response {
                code,
                message: message.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn sample_artist(mbid: &str) -> Artist {
    Artist {
        id: mbid.to_string(),
        name: "Blind Melon".to_string(),
        sort_name: Some("Blind Melon".to_string()),
        artist_type: Some("Group".to_string()),
        country: Some("US".to_string()),
        life_span: None,
        relations: vec![
            Relation {
                relation_type: "official homepage".to_string(),
                url: Some(RelationUrl {
                    resource: "https://blindmelon.example".to_string(),
                }),
            },
            Relation {
                relation_type: "wikidata".to_string(),
                url: Some(RelationUrl {
                    resource: "https://www.wikidata.org/wiki/Q545461".to_string(),
                }),
            },
        ],
        external_urls: Default::default(),
    }
}

fn sample_release_group(mbid: &str) -> ReleaseGroup {
    ReleaseGroup {
        id: mbid.to_string(),
        title: "Soup".to_string(),
        primary_type: Some("Album".to_string()),
        first_release_date: Some("1995-08-15".to_string()),
        artist_credit: vec![ArtistCredit {
            name: "Blind Melon".to_string(),
            artist: Some(CreditedArtist {
                id: "artist-1".to_string(),
                name: "Blind Melon".to_string(),
            }),
        }],
        relations: vec![Relation {
            relation_type: "discogs".to_string(),
            url: Some(RelationUrl {
                resource: "https://www.discogs.com/master/41775".to_string(),
            }),
        }],
        external_urls: Default::default(),
    }
}

fn sample_release(mbid: &str) -> Release {
    Release {
        id: mbid.to_string(),
        title: "Soup".to_string(),
        status: Some("Official".to_string()),
        date: Some("1995-08-15".to_string()),
        country: Some("US".to_string()),
        artist_credit: vec![],
        media: vec![Medium {
            format: Some("CD".to_string()),
            track_count: 13,
        }],
    }
}

impl LookupClient for FakeClient {
    async fn artist_by_id(
        &self,
        mbid: &str,
        includes: &[String],
    ) -> Result<Artist, MusicBrainzError> {
        self.record(format!("artist:{mbid}:{}", includes.join("+")));
        self.fail_if_scripted()?;
        Ok(sample_artist(mbid))
    }

    async fn release_group_by_id(
        &self,
        mbid: &str,
        includes: &[String],
    ) -> Result<ReleaseGroup, MusicBrainzError> {
        self.record(format!("release-group:{mbid}:{}", includes.join("+")));
        self.fail_if_scripted()?;
        Ok(sample_release_group(mbid))
    }

    async fn release_by_id(
        &self,
        mbid: &str,
        includes: &[String],
    ) -> Result<Release, MusicBrainzError> {
        self.record(format!("release:{mbid}:{}", includes.join("+")));
        self.fail_if_scripted()?;
        Ok(sample_release(mbid))
    }

    async fn search_artists(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ArtistSearchResults, MusicBrainzError> {
        self.record(format!("search-artists:{query}:{limit}:{offset}"));
        self.fail_if_scripted()?;
        Ok(ArtistSearchResults {
            count: 1,
            artists: vec![sample_artist("artist-1")],
        })
    }

    async fn search_release_groups(
        &self,
        query: &str,
        artist: &str,
        release_group: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ReleaseGroupSearchResults, MusicBrainzError> {
        self.record(format!(
            "search-release-groups:{query}:{artist}:{release_group}:{limit}:{offset}"
        ));
        self.fail_if_scripted()?;
        Ok(ReleaseGroupSearchResults {
            count: 1,
            release_groups: vec![sample_release_group("rg-1")],
        })
    }

    async fn browse_release_groups(
        &self,
        artist_mbid: &str,
        release_types: &[String],
        limit: u32,
        offset: u32,
    ) -> Result<ReleaseGroupBrowseResults, MusicBrainzError> {
        self.record(format!(
            "browse:{artist_mbid}:{}:{limit}:{offset}",
            release_types.join("+")
        ));
        self.fail_if_scripted()?;
        Ok(ReleaseGroupBrowseResults {
            count: 1,
            release_groups: vec![sample_release_group("rg-1")],
        })
    }
}

fn lookup_with(client: FakeClient) -> (MusicBrainz<FakeClient>, Arc<Mutex<Vec<String>>>) {
    let calls = client.calls.clone();
    (MusicBrainz::with_client(client, CacheStore::new()), calls)
}

#[tokio::test]
async fn cache_hit_skips_the_remote_service() {
    let (mb, calls) = lookup_with(FakeClient::new());

    let first = mb.artist_by_id("mbid-1", &[]).await.unwrap().unwrap();
    let second = mb.artist_by_id("mbid-1", &[]).await.unwrap().unwrap();

    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn not_found_is_absence_not_an_error() {
    let (mb, calls) = lookup_with(FakeClient::failing(404, "Not Found"));

    let result = mb.artist_by_id("mbid-gone", &[]).await.unwrap();
    assert!(result.is_none());

    // Nothing was cached, so a second lookup asks the service again.
    let again = mb.artist_by_id("mbid-gone", &[]).await.unwrap();
    assert!(again.is_none());
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn other_errors_carry_code_and_message() {
    let (mb, _calls) = lookup_with(FakeClient::failing(503, "service unavailable"));

    let error = mb.artist_by_id("mbid-1", &[]).await.unwrap_err();

    match error {
        MusicBrainzError::Response { code, message } => {
            assert_eq!(code, 503);
            assert_eq!(message, "service unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn artist_relations_are_grouped_before_caching() {
    let (mb, _calls) = lookup_with(FakeClient::new());

    let artist = mb.artist_by_id("mbid-1", &[]).await.unwrap().unwrap();

    assert_eq!(
        artist.external_urls.get("official homepage"),
        Some(&vec!["https://blindmelon.example".to_string()])
    );
    assert_eq!(
        artist.external_urls.get("wikidata"),
        Some(&vec!["https://www.wikidata.org/wiki/Q545461".to_string()])
    );

    // The cached copy keeps the enrichment.
    let cached = mb.artist_by_id("mbid-1", &[]).await.unwrap().unwrap();
    assert_eq!(cached.external_urls, artist.external_urls);
}

#[tokio::test]
async fn release_is_stored_exactly_as_fetched() {
    let (mb, _calls) = lookup_with(FakeClient::new());

    let release = mb.release_by_id("rel-1", &[]).await.unwrap().unwrap();

    assert_eq!(release, sample_release("rel-1"));
}

#[tokio::test]
async fn includes_order_does_not_change_the_key() {
    let (mb, calls) = lookup_with(FakeClient::new());

    mb.artist_by_id("mbid-1", &["releases", "artists"]).await.unwrap();
    mb.artist_by_id("mbid-1", &["artists", "releases"]).await.unwrap();
    assert_eq!(calls.lock().unwrap().len(), 1);

    // A different includes list is a different key.
    mb.artist_by_id("mbid-1", &["artists"]).await.unwrap();
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn release_group_details_matches_the_by_id_lookup() {
    let (mb, calls) = lookup_with(FakeClient::new());

    let details = mb.release_group_details("rg-9").await.unwrap().unwrap();
    let by_id = mb
        .release_group_by_id("rg-9", &["artists"])
        .await
        .unwrap()
        .unwrap();

    // Same key, so the second call was a hit; same transform applied.
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(details, by_id);
    assert_eq!(
        details.external_urls.get("discogs"),
        Some(&vec!["https://www.discogs.com/master/41775".to_string()])
    );
}

#[tokio::test]
async fn browse_pages_are_cached_per_filter() {
    let (mb, calls) = lookup_with(FakeClient::new());

    let first = mb
        .browse_release_groups("a1", &["album"], Some(10), Some(0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.count, 1);
    assert_eq!(calls.lock().unwrap().len(), 1);

    mb.browse_release_groups("a1", &["album"], Some(10), Some(0))
        .await
        .unwrap();
    assert_eq!(calls.lock().unwrap().len(), 1);

    mb.browse_release_groups("a1", &["single"], Some(10), Some(0))
        .await
        .unwrap();
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn omitted_paging_shares_a_key_with_explicit_defaults() {
    let (mb, calls) = lookup_with(FakeClient::new());

    mb.browse_release_groups("a2", &[], None, None).await.unwrap();
    mb.browse_release_groups("a2", &[], Some(25), Some(0))
        .await
        .unwrap();

    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn browse_reports_missing_artist_as_absence() {
    let (mb, _calls) = lookup_with(FakeClient::failing(404, "Not Found"));

    let result = mb
        .browse_release_groups("a-gone", &[], None, None)
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn search_results_are_never_cached() {
    let (mb, calls) = lookup_with(FakeClient::new());

    mb.search_artists("melon", None, None).await.unwrap();
    mb.search_artists("melon", None, None).await.unwrap();
    assert_eq!(calls.lock().unwrap().len(), 2);

    mb.search_release_groups("soup", "blind melon", "", None, None)
        .await
        .unwrap();
    mb.search_release_groups("soup", "blind melon", "", None, None)
        .await
        .unwrap();
    assert_eq!(calls.lock().unwrap().len(), 4);
}
