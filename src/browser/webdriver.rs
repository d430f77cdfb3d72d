use super::{DomDriver, ElementHandle};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method};
use serde_json::{json, Value};

/// Key under which W3C WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// A Chrome session driven over the W3C WebDriver HTTP protocol
/// (chromedriver, selenium standalone, ...).
pub struct WebDriverSession {
    client: Client,
    base: String,
    session_id: Option<String>,
}

impl WebDriverSession {
    /// Open a new browser session on the WebDriver server at `base`.
    pub async fn start(base: &str, headless: bool) -> Result<Self> {
        let client = Client::new();
        let base = base.trim_end_matches('/').to_string();
        let mut args = vec!["--window-size=1280,2000"];
        if headless {
            args.push("--headless=new");
        }
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        });
        let resp = client
            .post(format!("{}/session", base))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to WebDriver at {}", base))?;
        let status = resp.status();
        let j: Value = resp.json().await?;
        if !status.is_success() {
            return Err(anyhow!("new session failed: {} => {}", status, j["value"]));
        }
        let session_id = j["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| anyhow!("no sessionId in new session response"))?
            .to_string();
        debug!("WebDriver session {} started", session_id);
        Ok(Self { client, base, session_id: Some(session_id) })
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn session_url(&self, path: &str) -> Result<String> {
        let sid = self
            .session_id
            .as_deref()
            .ok_or_else(|| anyhow!("WebDriver session already closed"))?;
        Ok(format!("{}/session/{}{}", self.base, sid, path))
    }

    /// Send one command. `Ok(Err(code))` carries a WebDriver error code such as
    /// "no such element" so callers can treat it as a normal outcome.
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<std::result::Result<Value, String>> {
        let url = self.session_url(path)?;
        let mut req = self.client.request(method, &url);
        if let Some(b) = body {
            req = req.json(&b);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let j: Value = resp.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(Ok(j["value"].clone()));
        }
        match j["value"]["error"].as_str() {
            Some(code) => Ok(Err(code.to_string())),
            None => Err(anyhow!("WebDriver {} failed: {}", url, status)),
        }
    }

    fn element_from(v: &Value) -> Result<ElementHandle> {
        v[ELEMENT_KEY]
            .as_str()
            .map(|id| ElementHandle(id.to_string()))
            .ok_or_else(|| anyhow!("malformed element reference: {}", v))
    }
}

fn by_css(selector: &str) -> Value {
    json!({ "using": "css selector", "value": selector })
}

#[async_trait]
impl DomDriver for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        match self.command(Method::POST, "/url", Some(json!({ "url": url }))).await? {
            Ok(_) => Ok(()),
            Err(code) => Err(anyhow!("navigate to {} failed: {}", url, code)),
        }
    }

    async fn find_element(&mut self, selector: &str) -> Result<Option<ElementHandle>> {
        match self.command(Method::POST, "/element", Some(by_css(selector))).await? {
            Ok(v) => Ok(Some(Self::element_from(&v)?)),
            Err(code) if code == "no such element" => Ok(None),
            Err(code) => Err(anyhow!("find {} failed: {}", selector, code)),
        }
    }

    async fn find_elements_within(&mut self, parent: &ElementHandle, selector: &str) -> Result<Vec<ElementHandle>> {
        let path = format!("/element/{}/elements", parent.0);
        match self.command(Method::POST, &path, Some(by_css(selector))).await? {
            Ok(Value::Array(items)) => items.iter().map(Self::element_from).collect(),
            Ok(other) => Err(anyhow!("expected element list, got {}", other)),
            Err(code) => Err(anyhow!("find {} within {} failed: {}", selector, parent.0, code)),
        }
    }

    async fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let path = format!("/element/{}/attribute/{}", element.0, name);
        match self.command(Method::GET, &path, None).await? {
            Ok(Value::String(s)) => Ok(Some(s)),
            Ok(_) => Ok(None),
            Err(code) => Err(anyhow!("read {} of {} failed: {}", name, element.0, code)),
        }
    }

    async fn close(&mut self) -> Result<()> {
        let url = match self.session_url("") {
            Ok(u) => u,
            Err(_) => return Ok(()),
        };
        let sid = self.session_id.take();
        let resp = self.client.delete(&url).send().await?;
        if !resp.status().is_success() {
            warn!("closing WebDriver session {:?} returned {}", sid, resp.status());
        }
        Ok(())
    }
}
