//! The discovery loop: artists in, deduplicated playlist registry out.
//!
//! Every artist is scraped in turn. A playlist id seen for the first time is
//! resolved through the metadata API and registered with that artist as its
//! first featured artist; an id already in the registry only gains another
//! featured artist. Failures are contained to the artist or playlist they
//! concern and reported through an [`AggregationSink`].

use crate::api::MetadataApi;
use crate::discover::PlaylistSource;
use crate::error::ResolveError;
use crate::models::{PlaylistId, PlaylistRecord};
use crate::resolver::MetadataResolver;
use indexmap::IndexMap;
use std::fmt::Display;
use tracing::{info, warn};

/// Playlist id -> record, in first-discovery order.
pub type Registry = IndexMap<PlaylistId, PlaylistRecord>;

/// Receives the notable events of one aggregation run.
pub trait AggregationSink: Send {
    /// The artist's page was read.
    fn artist_scanned(&mut self, artist_id: &str, artist_name: &str, discovered: usize);

    /// The artist contributed nothing because a lookup or the scrape failed.
    fn artist_skipped(&mut self, artist_id: &str, reason: &dyn Display);

    fn resolution_failed(&mut self, artist_name: &str, error: &ResolveError);

    fn playlist_registered(&mut self, _record: &PlaylistRecord) {}
}

/// Default sink: structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AggregationSink for TracingSink {
    fn artist_scanned(&mut self, artist_id: &str, artist_name: &str, discovered: usize) {
        info!(artist_id, "{} discovered on {} playlists", artist_name, discovered);
    }

    fn artist_skipped(&mut self, artist_id: &str, reason: &dyn Display) {
        warn!(artist_id, "skipping artist: {}", reason);
    }

    fn resolution_failed(&mut self, artist_name: &str, error: &ResolveError) {
        warn!(playlist_id = error.playlist_id(), artist = artist_name, "{}", error);
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    pub artists_processed: usize,
    pub artists_skipped: usize,
    pub playlists_discovered: usize,
    pub resolutions_attempted: usize,
    pub resolutions_failed: usize,
    pub registry_size: usize,
}

#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    pub registry: Registry,
    pub summary: AggregationSummary,
}

/// State owned by a single `aggregate` call.
#[derive(Default)]
struct RunContext {
    registry: Registry,
    summary: AggregationSummary,
}

pub struct AggregationEngine<S: PlaylistSource, A: MetadataApi, K: AggregationSink = TracingSink> {
    source: S,
    resolver: MetadataResolver<A>,
    sink: K,
}

impl<S: PlaylistSource, A: MetadataApi> AggregationEngine<S, A, TracingSink> {
    pub fn new(source: S, api: A) -> Self {
        Self::with_sink(source, api, TracingSink)
    }
}

impl<S: PlaylistSource, A: MetadataApi, K: AggregationSink> AggregationEngine<S, A, K> {
    pub fn with_sink(source: S, api: A, sink: K) -> Self {
        Self {
            source,
            resolver: MetadataResolver::new(api),
            sink,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn api(&self) -> &A {
        self.resolver.api()
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_parts(self) -> (S, A, K) {
        (self.source, self.resolver.into_api(), self.sink)
    }

    /// Process `artist_ids` in order and return the registry they produce.
    /// Never fails as a whole: problems with one artist or playlist are
    /// reported to the sink and the run moves on.
    pub async fn aggregate(&mut self, artist_ids: &[String]) -> AggregationOutcome {
        let mut ctx = RunContext::default();
        for artist_id in artist_ids {
            self.process_artist(&mut ctx, artist_id).await;
        }
        ctx.summary.registry_size = ctx.registry.len();
        AggregationOutcome {
            registry: ctx.registry,
            summary: ctx.summary,
        }
    }

    async fn process_artist(&mut self, ctx: &mut RunContext, artist_id: &str) {
        let artist_name = match self.resolver.api().artist_name(artist_id).await {
            Ok(n) => n,
            Err(e) => {
                ctx.summary.artists_skipped += 1;
                self.sink
                    .artist_skipped(artist_id, &format_args!("artist lookup failed: {:#}", e));
                return;
            }
        };

        let discovered = match self.source.discover(artist_id).await {
            Ok(ids) => ids,
            Err(e) => {
                ctx.summary.artists_skipped += 1;
                self.sink.artist_skipped(artist_id, &e);
                return;
            }
        };
        ctx.summary.artists_processed += 1;
        ctx.summary.playlists_discovered += discovered.len();
        self.sink.artist_scanned(artist_id, &artist_name, discovered.len());

        for playlist_id in discovered {
            if let Some(record) = ctx.registry.get_mut(&playlist_id) {
                record.feature(&artist_name);
                continue;
            }
            ctx.summary.resolutions_attempted += 1;
            match self.resolver.resolve(&playlist_id).await {
                Ok(mut record) => {
                    record.feature(&artist_name);
                    self.sink.playlist_registered(&record);
                    ctx.registry.insert(playlist_id, record);
                }
                Err(e) => {
                    ctx.summary.resolutions_failed += 1;
                    self.sink.resolution_failed(&artist_name, &e);
                }
            }
        }
    }
}

/// Run one aggregation over `source`, then release it whether or not any
/// artist succeeded. A failure to release is logged, not returned.
pub async fn aggregate_scoped<S, A, K>(engine: &mut AggregationEngine<S, A, K>, artist_ids: &[String]) -> AggregationOutcome
where
    S: PlaylistSource,
    A: MetadataApi,
    K: AggregationSink,
{
    let outcome = engine.aggregate(artist_ids).await;
    if let Err(e) = engine.source_mut().close().await {
        warn!("failed to release browser session: {:#}", e);
    }
    info!(
        artists = outcome.summary.artists_processed,
        skipped = outcome.summary.artists_skipped,
        discovered = outcome.summary.playlists_discovered,
        failed = outcome.summary.resolutions_failed,
        "registered {} playlists",
        outcome.summary.registry_size
    );
    outcome
}
