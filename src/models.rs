use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub type ArtistId = String;
pub type PlaylistId = String;

/// Where the artist ids of a run came from. Also drives the export file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtistSource {
    /// Newline-separated id list on disk.
    File(PathBuf),
    /// Ids given directly on the command line.
    Literal(Vec<String>),
}

// ---------------------------------------------------------------------------
// Remote representations (GET /playlists/{id})
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Followers {
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Owner {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub uri: String,
    /// Only present for owners with a public profile.
    #[serde(default)]
    pub followers: Option<Followers>,
}

/// One entry of a playlist's track list; only the addition time matters here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackAdditionEvent {
    #[serde(default)]
    pub added_at: Option<String>,
}

/// A page of playlist items. `next` points at the following page, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<TrackAdditionEvent>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaylistRepresentation {
    #[serde(default)]
    pub id: String,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub followers: Followers,
    pub owner: Owner,
    pub tracks: TrackPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRepresentation {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Registry entries
// ---------------------------------------------------------------------------

/// Aggregated state of one playlist.
///
/// Everything except the featured artists is fixed at resolution time. The
/// featured artists can only grow, and only through [`PlaylistRecord::feature`],
/// so the count always matches the list.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistRecord {
    pub id: PlaylistId,
    pub uri: String,
    pub name: String,
    pub description: String,
    pub follower_count: u64,
    pub track_count: u64,
    pub last_updated: Option<DateTime<Utc>>,
    pub owner_name: String,
    pub owner_uri: String,
    pub owner_follower_count: u64,
    featured_artists: Vec<String>,
}

impl PlaylistRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PlaylistId,
        uri: String,
        name: String,
        description: String,
        follower_count: u64,
        track_count: u64,
        last_updated: Option<DateTime<Utc>>,
        owner_name: String,
        owner_uri: String,
        owner_follower_count: u64,
    ) -> Self {
        Self {
            id,
            uri,
            name,
            description,
            follower_count,
            track_count,
            last_updated,
            owner_name,
            owner_uri,
            owner_follower_count,
            featured_artists: Vec::new(),
        }
    }

    /// Record one more discovery of this playlist for `artist_name`.
    /// Repeated names are kept.
    pub fn feature(&mut self, artist_name: &str) {
        self.featured_artists.push(artist_name.to_string());
    }

    pub fn featured_artists(&self) -> &[String] {
        &self.featured_artists
    }

    pub fn featured_artist_count(&self) -> usize {
        self.featured_artists.len()
    }
}
