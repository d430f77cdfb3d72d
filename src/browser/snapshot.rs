use super::{DomDriver, ElementHandle};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Serves already-rendered pages instead of driving a browser.
///
/// Pages come from an in-memory map keyed by URL or, failing that, from
/// `<dir>/<artist_id>.html` for artist URLs. Useful for re-running an export
/// from saved pages and for tests.
#[derive(Default)]
pub struct SnapshotDriver {
    pages: HashMap<String, String>,
    dir: Option<PathBuf>,
    current: Option<String>,
    visited: Vec<String>,
    closed: bool,
}

/// Element handles are the chain of (selector, index) steps that reach the
/// element from the document root, serialized as JSON.
type Steps = Vec<(String, usize)>;

impl SnapshotDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Some(dir.into()), ..Self::default() }
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// URLs navigated to so far, in order.
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn load(&self, url: &str) -> Result<String> {
        if let Some(html) = self.pages.get(url) {
            return Ok(html.clone());
        }
        let dir = self
            .dir
            .as_ref()
            .ok_or_else(|| anyhow!("no snapshot for {}", url))?;
        let file = dir.join(snapshot_file_name(url).ok_or_else(|| anyhow!("cannot map {} to a snapshot file", url))?);
        std::fs::read_to_string(&file).with_context(|| format!("reading snapshot {}", file.display()))
    }

    fn document(&self) -> Result<Html> {
        let html = self
            .current
            .as_deref()
            .ok_or_else(|| anyhow!("no page loaded"))?;
        Ok(Html::parse_document(html))
    }
}

/// `.../artist/<id>/...` maps to `<id>.html`; anything else to its last segment.
pub fn snapshot_file_name(url: &str) -> Option<String> {
    let path = url::Url::parse(url).map(|u| u.path().to_string()).unwrap_or_else(|_| url.to_string());
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let name = match segments.iter().position(|s| *s == "artist") {
        Some(i) if i + 1 < segments.len() => segments[i + 1],
        _ => *segments.last()?,
    };
    Some(format!("{}.html", name))
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid selector {:?}: {:?}", selector, e))
}

fn encode(path: &Steps) -> Result<ElementHandle> {
    Ok(ElementHandle(serde_json::to_string(path)?))
}

fn decode(handle: &ElementHandle) -> Result<Steps> {
    serde_json::from_str(&handle.0).map_err(|_| anyhow!("stale or foreign element handle {}", handle.0))
}

fn resolve<'a>(doc: &'a Html, path: &Steps) -> Result<ElementRef<'a>> {
    let mut cur = doc.root_element();
    for (selector, idx) in path {
        let sel = parse_selector(selector)?;
        cur = cur
            .select(&sel)
            .nth(*idx)
            .ok_or_else(|| anyhow!("element {}[{}] no longer on page", selector, idx))?;
    }
    Ok(cur)
}

#[async_trait]
impl DomDriver for SnapshotDriver {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("snapshot: navigate {}", url);
        self.visited.push(url.to_string());
        self.current = Some(self.load(url)?);
        Ok(())
    }

    async fn find_element(&mut self, selector: &str) -> Result<Option<ElementHandle>> {
        let doc = self.document()?;
        let sel = parse_selector(selector)?;
        if doc.root_element().select(&sel).next().is_none() {
            return Ok(None);
        }
        encode(&vec![(selector.to_string(), 0)]).map(Some)
    }

    async fn find_elements_within(&mut self, parent: &ElementHandle, selector: &str) -> Result<Vec<ElementHandle>> {
        let doc = self.document()?;
        let parent_path = decode(parent)?;
        let sel = parse_selector(selector)?;
        let count = resolve(&doc, &parent_path)?.select(&sel).count();
        (0..count)
            .map(|i| {
                let mut p = parent_path.clone();
                p.push((selector.to_string(), i));
                encode(&p)
            })
            .collect()
    }

    async fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let doc = self.document()?;
        let el = resolve(&doc, &decode(element)?)?;
        Ok(el.value().attr(name).map(|s| s.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.current = None;
        Ok(())
    }
}
