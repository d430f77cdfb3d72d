pub mod spotify;
pub mod mock;
pub mod spotify_auth;

use crate::models::PlaylistRepresentation;
use anyhow::Result;

/// The remote metadata operations the aggregation needs.
/// Implementations: spotify::SpotifyClient and mock::MockMetadataApi.
#[async_trait::async_trait]
pub trait MetadataApi: Send + Sync {
    /// Display name of an artist.
    async fn artist_name(&self, artist_id: &str) -> Result<String>;

    /// Full playlist representation. `tracks.items` holds every item of the
    /// playlist, not just the first page; `tracks.next` is then `None`.
    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistRepresentation>;

    /// Return the API's name (for logging)
    fn name(&self) -> &str;
}
