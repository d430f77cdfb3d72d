use super::MetadataApi;
use crate::models::{Followers, Owner, PlaylistRepresentation, TrackAdditionEvent, TrackPage};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

/// An in-memory metadata API used in tests and offline runs.
/// Unknown ids fail the way a 404 from the real API would. Every playlist
/// lookup is counted so callers can check how often resolution happened.
#[derive(Default)]
pub struct MockMetadataApi {
    artists: HashMap<String, String>,
    playlists: HashMap<String, PlaylistRepresentation>,
    playlist_calls: Mutex<HashMap<String, usize>>,
}

impl MockMetadataApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artist(mut self, artist_id: &str, name: &str) -> Self {
        self.artists.insert(artist_id.to_string(), name.to_string());
        self
    }

    pub fn with_playlist(mut self, playlist: PlaylistRepresentation) -> Self {
        self.playlists.insert(playlist.id.clone(), playlist);
        self
    }

    /// How many times `playlist()` was asked for this id.
    pub fn playlist_calls(&self, playlist_id: &str) -> usize {
        self.playlist_calls
            .lock()
            .map(|m| m.get(playlist_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

/// A plausible public playlist with one item per `added_at` entry.
pub fn playlist_fixture(id: &str, name: &str, added_at: &[Option<&str>]) -> PlaylistRepresentation {
    PlaylistRepresentation {
        id: id.to_string(),
        uri: format!("spotify:playlist:{}", id),
        name: name.to_string(),
        description: Some(format!("{} description", name)),
        followers: Followers { total: Some(1200) },
        owner: Owner {
            display_name: Some("Curator".into()),
            uri: "spotify:user:curator".into(),
            followers: None,
        },
        tracks: TrackPage {
            items: added_at
                .iter()
                .map(|a| TrackAdditionEvent { added_at: a.map(|s| s.to_string()) })
                .collect(),
            total: added_at.len() as u64,
            next: None,
        },
    }
}

#[async_trait]
impl MetadataApi for MockMetadataApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn artist_name(&self, artist_id: &str) -> Result<String> {
        info!("MockMetadataApi: artist {}", artist_id);
        self.artists
            .get(artist_id)
            .cloned()
            .ok_or_else(|| anyhow!("artist {} not found", artist_id))
    }

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistRepresentation> {
        info!("MockMetadataApi: playlist {}", playlist_id);
        if let Ok(mut calls) = self.playlist_calls.lock() {
            *calls.entry(playlist_id.to_string()).or_insert(0) += 1;
        }
        self.playlists
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| anyhow!("playlist {} not found (404)", playlist_id))
    }
}
