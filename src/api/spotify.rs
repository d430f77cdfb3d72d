use super::spotify_auth::{AccessToken, ClientCredentials};
use super::MetadataApi;
use crate::models::{ArtistRepresentation, PlaylistRepresentation, TrackPage};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

/// Read-only Spotify Web API client for artist and playlist lookups.
/// Uses an app token from the client-credentials grant, refreshed shortly
/// before expiry and once more if the API answers 401.
/// Endpoints come from `Config` (`api_base`, `auth_base`), which tests point at a local server.
pub struct SpotifyClient {
    client: Client,
    credentials: ClientCredentials,
    api_base: String,
    auth_base: String,
    token: tokio::sync::Mutex<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn with_endpoints(credentials: ClientCredentials, api_base: &str, auth_base: &str) -> Self {
        Self {
            client: Client::new(),
            credentials,
            api_base: api_base.trim_end_matches('/').to_string(),
            auth_base: auth_base.trim_end_matches('/').to_string(),
            token: tokio::sync::Mutex::new(None),
        }
    }

    async fn get_bearer(&self) -> Result<String> {
        let mut lock = self.token.lock().await;
        let now = Utc::now().timestamp();
        let stale = lock.as_ref().map(|t| !t.is_fresh(now)).unwrap_or(true);
        if stale {
            debug!("Spotify app token missing or near expiry, requesting a new one");
            let t = self
                .credentials
                .request_token(&self.client, &self.auth_base)
                .await?;
            *lock = Some(t);
        }
        let t = lock.as_ref().ok_or_else(|| anyhow!("no token loaded"))?;
        Ok(format!("Bearer {}", t.access_token))
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// GET `url` and decode the JSON body. Retries once with a new token on 401.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let bearer = self.get_bearer().await?;
            let resp = self
                .client
                .get(url)
                .header(AUTHORIZATION, &bearer)
                .header(ACCEPT, "application/json")
                .send()
                .await?;
            let status = resp.status();

            if status == StatusCode::UNAUTHORIZED && attempt == 1 {
                warn!("Got 401 for {}; requesting a new token", url);
                self.invalidate_token().await;
                continue;
            }

            if !status.is_success() {
                let txt = resp.text().await.unwrap_or_default();
                return Err(anyhow!("GET {} failed: {} => {}", url, status, txt));
            }
            return resp
                .json::<T>()
                .await
                .with_context(|| format!("decoding response of {}", url));
        }
    }
}

#[async_trait]
impl MetadataApi for SpotifyClient {
    fn name(&self) -> &str {
        "spotify"
    }

    async fn artist_name(&self, artist_id: &str) -> Result<String> {
        let url = format!("{}/artists/{}", self.api_base, urlencoding::encode(artist_id));
        let artist: ArtistRepresentation = self.get_json(&url).await?;
        Ok(artist.name)
    }

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistRepresentation> {
        let url = format!("{}/playlists/{}", self.api_base, urlencoding::encode(playlist_id));
        let mut playlist: PlaylistRepresentation = self.get_json(&url).await?;

        // The first page of items is embedded; walk the rest.
        let mut next = playlist.tracks.next.take();
        while let Some(page_url) = next {
            let page: TrackPage = self.get_json(&page_url).await?;
            playlist.tracks.items.extend(page.items);
            next = page.next;
        }
        debug!(
            "fetched playlist {} with {} of {} items",
            playlist_id,
            playlist.tracks.items.len(),
            playlist.tracks.total
        );
        Ok(playlist)
    }
}
