//! Relationship post-processing for fetched entities.
//!
//! MusicBrainz returns an entity's relations as a flat list; reviews
//! display them grouped by kind (official homepage, wikidata, discogs,
//! and so on), so the lookup layer enriches Artist and Release Group
//! values with a grouped `external_urls` map before caching them.
//! Releases are stored exactly as fetched.

use crate::models::{Artist, ExternalUrls, Relation, ReleaseGroup};

pub fn process_artist(mut artist: Artist) -> Artist {
    artist.external_urls = group_url_relations(&artist.relations);
    artist
}

pub fn process_release_group(mut release_group: ReleaseGroup) -> ReleaseGroup {
    release_group.external_urls = group_url_relations(&release_group.relations);
    release_group
}

fn group_url_relations(relations: &[Relation]) -> ExternalUrls {
    let mut grouped = ExternalUrls::new();
    for relation in relations {
        if let Some(url) = &relation.url {
            grouped
                .entry(relation.relation_type.clone())
                .or_default()
                .push(url.resource.clone());
        }
    }
    grouped
}
