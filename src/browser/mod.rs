pub mod snapshot;
pub mod webdriver;

use anyhow::Result;

/// Opaque reference to an element on the current page. Only meaningful to the
/// driver that handed it out, and only until the next navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(pub String);

/// The DOM queries page scraping needs from a browser.
/// Implementations: webdriver::WebDriverSession (live browser) and
/// snapshot::SnapshotDriver (saved HTML).
#[async_trait::async_trait]
pub trait DomDriver: Send {
    /// Load `url` in the current window.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// First element matching `selector`, or None if nothing matches yet.
    async fn find_element(&mut self, selector: &str) -> Result<Option<ElementHandle>>;

    /// All descendants of `parent` matching `selector`, in document order.
    async fn find_elements_within(&mut self, parent: &ElementHandle, selector: &str) -> Result<Vec<ElementHandle>>;

    async fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>>;

    /// End the session. Called once, after the last artist.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
