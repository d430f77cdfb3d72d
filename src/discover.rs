//! Reading playlist ids off an artist's "discovered on" page.

use crate::browser::{DomDriver, ElementHandle};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::models::PlaylistId;
use crate::util::playlist_id_from_href;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Anything that can list the playlists an artist was discovered on.
/// `PageScraper` is the real one; tests substitute canned answers.
#[async_trait]
pub trait PlaylistSource: Send {
    /// Playlist ids in page order, duplicates included. Empty is not an error.
    async fn discover(&mut self, artist_id: &str) -> Result<Vec<PlaylistId>, ScrapeError>;

    /// Release whatever the source holds (browser session, ...).
    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub base_url: String,
    pub grid_selector: String,
    pub link_selector: String,
    /// Fixed wait after navigation before the first DOM query.
    pub settle_delay: Duration,
    /// How long to keep polling for the grid after the settle delay.
    pub render_timeout: Duration,
    pub poll_interval: Duration,
}

impl From<&Config> for ScrapeSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            grid_selector: cfg.grid_selector.clone(),
            link_selector: cfg.link_selector.clone(),
            settle_delay: cfg.settle_delay(),
            render_timeout: cfg.render_timeout(),
            poll_interval: cfg.poll_interval(),
        }
    }
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

pub struct PageScraper<D: DomDriver> {
    driver: D,
    settings: ScrapeSettings,
}

impl<D: DomDriver> PageScraper<D> {
    pub fn new(driver: D, settings: ScrapeSettings) -> Self {
        Self { driver, settings }
    }

    pub fn discovered_on_url(&self, artist_id: &str) -> String {
        format!(
            "{}/artist/{}/discovered-on",
            self.settings.base_url,
            urlencoding::encode(artist_id)
        )
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Settle, then poll until the grid container exists or the render
    /// timeout runs out.
    async fn wait_for_grid(&mut self, artist_id: &str) -> Result<ElementHandle, ScrapeError> {
        tokio::time::sleep(self.settings.settle_delay).await;
        let started = Instant::now();
        let deadline = started + self.settings.render_timeout;
        loop {
            if let Some(grid) = self.driver.find_element(&self.settings.grid_selector).await? {
                return Ok(grid);
            }
            if Instant::now() >= deadline {
                let waited = self.settings.settle_delay + started.elapsed();
                return Err(ScrapeError::RenderTimeout {
                    artist_id: artist_id.to_string(),
                    selector: self.settings.grid_selector.clone(),
                    waited_ms: waited.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

#[async_trait]
impl<D: DomDriver> PlaylistSource for PageScraper<D> {
    async fn discover(&mut self, artist_id: &str) -> Result<Vec<PlaylistId>, ScrapeError> {
        let url = self.discovered_on_url(artist_id);
        self.driver.navigate(&url).await?;
        let grid = self.wait_for_grid(artist_id).await?;

        let links = self
            .driver
            .find_elements_within(&grid, &self.settings.link_selector)
            .await?;
        let mut ids = Vec::with_capacity(links.len());
        for link in &links {
            match self.driver.attribute(link, "href").await? {
                Some(href) => match playlist_id_from_href(&href) {
                    Some(id) => ids.push(id),
                    None => debug!("skipping link with unusable href {:?}", href),
                },
                None => debug!("skipping link without href on {}", url),
            }
        }
        Ok(ids)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.driver.close().await
    }
}
