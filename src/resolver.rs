use crate::api::MetadataApi;
use crate::error::ResolveError;
use crate::models::{PlaylistRecord, PlaylistRepresentation, TrackAdditionEvent};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Turns playlist ids into records through a [`MetadataApi`].
pub struct MetadataResolver<A: MetadataApi> {
    api: A,
}

impl<A: MetadataApi> MetadataResolver<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn into_api(self) -> A {
        self.api
    }

    /// One remote fetch, then validation. Never panics on odd payloads; every
    /// problem comes back as a [`ResolveError`]. The returned record has no
    /// featured artists yet.
    pub async fn resolve(&self, playlist_id: &str) -> Result<PlaylistRecord, ResolveError> {
        debug!(api = self.api.name(), playlist_id, "resolving playlist");
        let playlist = self
            .api
            .playlist(playlist_id)
            .await
            .map_err(|e| ResolveError::FetchFailure {
                playlist_id: playlist_id.to_string(),
                reason: format!("{:#}", e),
            })?;
        record_from(playlist_id, playlist)
    }
}

/// Latest parseable `added_at`. `Ok(None)` for an empty track list,
/// `MetadataIncomplete` when there are tracks but no usable timestamp among them.
fn last_added(playlist_id: &str, events: &[TrackAdditionEvent]) -> Result<Option<DateTime<Utc>>, ResolveError> {
    if events.is_empty() {
        return Ok(None);
    }
    events
        .iter()
        .filter_map(|e| e.added_at.as_deref())
        .filter_map(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .max()
        .map(Some)
        .ok_or_else(|| ResolveError::MetadataIncomplete {
            playlist_id: playlist_id.to_string(),
        })
}

pub fn record_from(playlist_id: &str, p: PlaylistRepresentation) -> Result<PlaylistRecord, ResolveError> {
    let last_updated = last_added(playlist_id, &p.tracks.items)?;
    Ok(PlaylistRecord::new(
        playlist_id.to_string(),
        p.uri,
        p.name,
        p.description.unwrap_or_default(),
        p.followers.total.unwrap_or(0),
        p.tracks.total,
        last_updated,
        p.owner.display_name.unwrap_or_default(),
        p.owner.uri,
        p.owner.followers.and_then(|f| f.total).unwrap_or(0),
    ))
}
