use crate::models::ArtistSource;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static ARTIST_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:spotify:artist:|https?://open\.spotify\.com/(?:intl-[a-z]+/)?artist/)([A-Za-z0-9]+)")
        .expect("artist reference regex")
});

/// Accept bare ids, `spotify:artist:<id>` URIs and open.spotify.com artist URLs.
pub fn normalize_artist_id(raw: &str) -> String {
    let raw = raw.trim();
    match ARTIST_REF.captures(raw) {
        Some(c) => c[1].to_string(),
        None => raw.to_string(),
    }
}

/// Parse a newline-separated artist list. Blank lines are dropped.
pub fn parse_artist_ids(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(normalize_artist_id)
        .collect()
}

pub fn read_artist_ids(path: &Path) -> Result<Vec<String>> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading artist list {}", path.display()))?;
    Ok(parse_artist_ids(&s))
}

impl ArtistSource {
    /// Resolve the source to the ordered list of ids to process.
    pub fn artist_ids(&self) -> Result<Vec<String>> {
        match self {
            ArtistSource::File(p) => read_artist_ids(p),
            ArtistSource::Literal(ids) => Ok(ids.iter().map(|s| normalize_artist_id(s)).collect()),
        }
    }
}

/// The playlist id is the last path segment of a link's href. Works for both
/// absolute URLs and site-relative paths; query and fragment are ignored.
pub fn playlist_id_from_href(href: &str) -> Option<String> {
    let path = match url::Url::parse(href) {
        Ok(u) => u.path().to_string(),
        Err(_) => href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_last_segment() {
        assert_eq!(
            playlist_id_from_href("https://open.spotify.com/playlist/37i9dQZF1DX0XUsuxWHRQd?si=abc").as_deref(),
            Some("37i9dQZF1DX0XUsuxWHRQd")
        );
        assert_eq!(playlist_id_from_href("/playlist/abc123").as_deref(), Some("abc123"));
        assert_eq!(playlist_id_from_href("/playlist/abc123/").as_deref(), Some("abc123"));
        assert_eq!(playlist_id_from_href(""), None);
    }

    #[test]
    fn artist_references_are_normalized() {
        assert_eq!(normalize_artist_id("  4Z8W4fKeB5YxbusRsdQVPb "), "4Z8W4fKeB5YxbusRsdQVPb");
        assert_eq!(normalize_artist_id("spotify:artist:4Z8W4fKeB5YxbusRsdQVPb"), "4Z8W4fKeB5YxbusRsdQVPb");
        assert_eq!(
            normalize_artist_id("https://open.spotify.com/artist/4Z8W4fKeB5YxbusRsdQVPb?si=x"),
            "4Z8W4fKeB5YxbusRsdQVPb"
        );
    }

    #[test]
    fn artist_list_drops_blank_lines() {
        let ids = parse_artist_ids("a1\na2\n\n  a3  \n");
        assert_eq!(ids, vec!["a1", "a2", "a3"]);
    }
}
