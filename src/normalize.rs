use crate::aggregate::Registry;
use crate::error::ExportError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Column names of the export, in order. Matches the field order of [`ExportRecord`].
pub const EXPORT_FIELDS: [&str; 12] = [
    "id",
    "uri",
    "name",
    "description",
    "followers",
    "tracks",
    "last_updated",
    "owner",
    "owner_uri",
    "owner_followers",
    "featured_artists",
    "featured_artist_count",
];

/// One flat export row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub description: String,
    pub followers: u64,
    pub tracks: u64,
    #[serde(serialize_with = "timestamp_cell")]
    pub last_updated: Option<DateTime<Utc>>,
    pub owner: String,
    pub owner_uri: String,
    pub owner_followers: u64,
    #[serde(serialize_with = "list_literal")]
    pub featured_artists: Vec<String>,
    pub featured_artist_count: usize,
}

/// Flatten the registry in insertion order. The registry key becomes `id`.
pub fn normalize(registry: &Registry) -> Result<Vec<ExportRecord>, ExportError> {
    if registry.is_empty() {
        return Err(ExportError::EmptyExport);
    }
    Ok(registry
        .iter()
        .map(|(id, r)| ExportRecord {
            id: id.clone(),
            uri: r.uri.clone(),
            name: r.name.clone(),
            description: r.description.clone(),
            followers: r.follower_count,
            tracks: r.track_count,
            last_updated: r.last_updated,
            owner: r.owner_name.clone(),
            owner_uri: r.owner_uri.clone(),
            owner_followers: r.owner_follower_count,
            featured_artists: r.featured_artists().to_vec(),
            featured_artist_count: r.featured_artist_count(),
        })
        .collect())
}

fn timestamp_cell<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
    match ts {
        Some(t) => s.serialize_str(&t.format("%Y-%m-%d %H:%M:%S").to_string()),
        None => s.serialize_str(""),
    }
}

#[allow(clippy::ptr_arg)]
fn list_literal<S: Serializer>(names: &Vec<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_list(names))
}

/// Render names as `['A', 'B']`, the shape earlier exports of this table used.
pub fn format_list(names: &[String]) -> String {
    let items: Vec<String> = names.iter().map(|n| quote(n)).collect();
    format!("[{}]", items.join(", "))
}

fn quote(s: &str) -> String {
    let q = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaylistRecord;

    fn record(id: &str) -> PlaylistRecord {
        PlaylistRecord::new(
            id.into(),
            format!("spotify:playlist:{}", id),
            format!("Playlist {}", id),
            String::new(),
            10,
            3,
            None,
            "Owner".into(),
            "spotify:user:o".into(),
            0,
        )
    }

    #[test]
    fn empty_registry_is_an_error() {
        assert!(matches!(normalize(&Registry::new()), Err(ExportError::EmptyExport)));
    }

    #[test]
    fn keeps_insertion_order_and_injects_id() {
        let mut reg = Registry::new();
        let mut b = record("b");
        b.feature("X");
        let mut a = record("a");
        a.feature("Y");
        a.feature("Z");
        reg.insert("b".into(), b);
        reg.insert("a".into(), a);

        let rows = normalize(&reg).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(rows[1].featured_artists, vec!["Y", "Z"]);
        assert_eq!(rows[1].featured_artist_count, 2);
    }

    #[test]
    fn list_literal_quotes_like_python() {
        let names = vec!["Björk".to_string(), "Guns N' Roses".to_string(), "a'b\"c".to_string()];
        assert_eq!(format_list(&names), r#"['Björk', "Guns N' Roses", 'a\'b"c']"#);
        assert_eq!(format_list(&[]), "[]");
    }
}
