use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing::subscriber as tracing_subscriber_global;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use anyhow::{Context, Result};
use discovered_on as lib;
use lib::aggregate::{aggregate_scoped, AggregationEngine, AggregationOutcome};
use lib::api::spotify::SpotifyClient;
use lib::api::spotify_auth::ClientCredentials;
use lib::browser::snapshot::SnapshotDriver;
use lib::browser::webdriver::WebDriverSession;
use lib::browser::DomDriver;
use lib::config::Config;
use lib::discover::{PageScraper, ScrapeSettings};
use lib::export::{self, OutputEncoding};
use lib::models::ArtistSource;

#[derive(Parser)]
#[command(
    name = "discovered-on",
    version,
    about = "Collect the Spotify playlists a set of artists was discovered on into one table"
)]
struct Cli {
    /// Spotify artist ids, or a path to a text file of ids with --file
    #[arg(short, long, num_args = 1.., required = true)]
    artists: Vec<String>,

    /// Treat the first --artists value as a path to a newline-separated id list
    #[arg(short, long)]
    file: bool,

    /// Write the export here instead of the derived <name>_<timestamp>.csv
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to config TOML
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read saved pages (<DIR>/<artist_id>.html) instead of driving a browser
    #[arg(long, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,

    /// Output text encoding (utf16 or utf8)
    #[arg(long)]
    encoding: Option<OutputEncoding>,
}

/// Structured logging to stderr, plus a daily-rotated file when `log_dir` is set.
fn init_logging(cfg: &Config) -> Option<WorkerGuard> {
    // Bridge `log` records from the HTTP adapters into tracing.
    let _ = LogTracer::init();

    // Honor RUST_LOG if set, otherwise default to info.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match &cfg.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "discovered-on.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(non_blocking)), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    tracing_subscriber_global::set_global_default(subscriber)
        .expect("failed to set global tracing subscriber");
    guard
}

async fn run<D: DomDriver>(driver: D, cfg: &Config, api: SpotifyClient, artist_ids: &[String]) -> AggregationOutcome {
    let scraper = PageScraper::new(driver, ScrapeSettings::from(cfg));
    let mut engine = AggregationEngine::new(scraper, api);
    aggregate_scoped(&mut engine, artist_ids).await
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials usually live in a .env next to the artist lists.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let cfg = Config::load(cli.config.as_deref()).context("loading config")?;
    let _guard = init_logging(&cfg);

    let source = if cli.file {
        ArtistSource::File(PathBuf::from(&cli.artists[0]))
    } else {
        ArtistSource::Literal(cli.artists.clone())
    };
    let artist_ids = source.artist_ids()?;
    if artist_ids.is_empty() {
        warn!("no artist ids given");
    }
    info!("processing {} artists", artist_ids.len());

    let credentials = ClientCredentials::from_env().context("reading Spotify app credentials")?;
    let api = SpotifyClient::with_endpoints(credentials, &cfg.api_base, &cfg.auth_base);

    let outcome = match &cli.snapshot_dir {
        Some(dir) => run(SnapshotDriver::from_dir(dir), &cfg, api, &artist_ids).await,
        None => {
            let driver = WebDriverSession::start(&cfg.webdriver_url, cfg.headless)
                .await
                .with_context(|| format!("starting browser session via {}", cfg.webdriver_url))?;
            run(driver, &cfg, api, &artist_ids).await
        }
    };

    let records = lib::normalize::normalize(&outcome.registry).context("preparing export")?;
    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| export::output_path(&source, &export::nonce_now()));
    let encoding = cli.encoding.unwrap_or(cfg.output_encoding);
    export::write_export(&path, &records, encoding)
        .with_context(|| format!("writing export to {}", path.display()))?;

    info!("wrote {} playlists to {}", records.len(), path.display());
    Ok(())
}
