use thiserror::Error;

/// Why a playlist id could not be turned into a record.
///
/// Both variants are recovered by the aggregation loop: the playlist is
/// skipped and a later discovery of the same id tries again.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The remote API did not hand back a usable playlist (not found,
    /// transport error, auth failure, undecodable body).
    #[error("failed to fetch playlist spotify:playlist:{playlist_id}: {reason}")]
    FetchFailure { playlist_id: String, reason: String },

    /// The playlist has tracks, but none of them carries a parseable
    /// `added_at`, so there is no last-activity timestamp to report.
    #[error("playlist spotify:playlist:{playlist_id} has no parseable added_at timestamp")]
    MetadataIncomplete { playlist_id: String },
}

impl ResolveError {
    pub fn playlist_id(&self) -> &str {
        match self {
            ResolveError::FetchFailure { playlist_id, .. } => playlist_id,
            ResolveError::MetadataIncomplete { playlist_id } => playlist_id,
        }
    }
}

/// Failure to read the "discovered on" grid for one artist.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The grid container never showed up within the settle delay plus the
    /// render timeout.
    #[error("grid container `{selector}` not rendered for artist {artist_id} after {waited_ms} ms")]
    RenderTimeout {
        artist_id: String,
        selector: String,
        waited_ms: u64,
    },

    #[error("browser driver: {0:#}")]
    Driver(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing was registered, so there is no first record to take a header from.
    #[error("no playlists were registered; refusing to write an export without a header")]
    EmptyExport,

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
