use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// App credentials for the client-credentials grant. Public catalogue data
/// (artists, public playlists) needs nothing more than this.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_at: i64, // epoch seconds
}

impl AccessToken {
    /// Usable for at least another 30 seconds.
    pub fn is_fresh(&self, now: i64) -> bool {
        now + 30 < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 { 3600 }

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self { client_id: client_id.into(), client_secret: client_secret.into() }
    }

    /// Read SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET, falling back to the
    /// SPOTIPY_* names older `.env` files use.
    pub fn from_env() -> Result<Self> {
        let lookup = |primary: &str, legacy: &str| -> Result<String> {
            std::env::var(primary)
                .or_else(|_| std::env::var(legacy))
                .map(|v| v.trim().to_string())
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{} is not set", primary))
        };
        Ok(Self {
            client_id: lookup("SPOTIFY_CLIENT_ID", "SPOTIPY_CLIENT_ID")?,
            client_secret: lookup("SPOTIFY_CLIENT_SECRET", "SPOTIPY_CLIENT_SECRET")?,
        })
    }

    fn basic_auth_header(&self) -> String {
        format!(
            "Basic {}",
            general_purpose::STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret))
        )
    }

    /// Exchange the credentials for an app access token at `{auth_base}/api/token`.
    pub async fn request_token(&self, client: &Client, auth_base: &str) -> Result<AccessToken> {
        let url = format!("{}/api/token", auth_base.trim_end_matches('/'));
        let resp = client
            .post(&url)
            .header(AUTHORIZATION, self.basic_auth_header())
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(anyhow!("token request failed: {} => {}", status, txt));
        }
        let tr: TokenResponse = resp.json().await?;
        debug!("obtained Spotify app token valid for {}s", tr.expires_in);
        Ok(AccessToken {
            access_token: tr.access_token,
            expires_at: Utc::now().timestamp() + tr.expires_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_freshness_has_margin() {
        let t = AccessToken { access_token: "x".into(), expires_at: 1_000 };
        assert!(t.is_fresh(900));
        assert!(!t.is_fresh(970));
        assert!(!t.is_fresh(1_200));
    }

    #[test]
    fn basic_header_is_base64_of_id_and_secret() {
        let c = ClientCredentials::new("cid", "csecret");
        assert_eq!(c.basic_auth_header(), "Basic Y2lkOmNzZWNyZXQ=");
    }
}
