use discovered_on::browser::webdriver::WebDriverSession;
use discovered_on::browser::DomDriver;
use discovered_on::discover::{PageScraper, PlaylistSource, ScrapeSettings};
use discovered_on::error::ScrapeError;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::time::Duration;

const KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

fn settings() -> ScrapeSettings {
    ScrapeSettings {
        settle_delay: Duration::ZERO,
        render_timeout: Duration::from_millis(30),
        poll_interval: Duration::from_millis(10),
        ..ScrapeSettings::default()
    }
}

async fn mock_new_session(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/session")
        .match_body(Matcher::PartialJson(json!({
            "capabilities": { "alwaysMatch": { "browserName": "chrome" } }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "value": { "sessionId": "s1", "capabilities": {} } }).to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn scrapes_grid_links_over_webdriver() {
    let mut server = Server::new_async().await;
    let _m_session = mock_new_session(&mut server).await;

    let m_nav = server
        .mock("POST", "/session/s1/url")
        .match_body(Matcher::Json(json!({ "url": "https://open.spotify.com/artist/A1/discovered-on" })))
        .with_status(200)
        .with_body(json!({ "value": null }).to_string())
        .expect(1)
        .create_async()
        .await;
    let _m_grid = server
        .mock("POST", "/session/s1/element")
        .match_body(Matcher::PartialJson(json!({ "using": "css selector", "value": "div[data-testid=grid-container]" })))
        .with_status(200)
        .with_body(json!({ "value": { KEY: "grid" } }).to_string())
        .create_async()
        .await;
    let _m_links = server
        .mock("POST", "/session/s1/element/grid/elements")
        .with_status(200)
        .with_body(json!({ "value": [ { KEY: "e1" }, { KEY: "e2" }, { KEY: "e3" } ] }).to_string())
        .create_async()
        .await;
    let _m_e1 = server
        .mock("GET", "/session/s1/element/e1/attribute/href")
        .with_status(200)
        .with_body(json!({ "value": "https://open.spotify.com/playlist/P1" }).to_string())
        .create_async()
        .await;
    let _m_e2 = server
        .mock("GET", "/session/s1/element/e2/attribute/href")
        .with_status(200)
        .with_body(json!({ "value": null }).to_string())
        .create_async()
        .await;
    let _m_e3 = server
        .mock("GET", "/session/s1/element/e3/attribute/href")
        .with_status(200)
        .with_body(json!({ "value": "/playlist/P2" }).to_string())
        .create_async()
        .await;
    let m_delete = server
        .mock("DELETE", "/session/s1")
        .with_status(200)
        .with_body(json!({ "value": null }).to_string())
        .expect(1)
        .create_async()
        .await;

    let driver = WebDriverSession::start(&server.url(), true).await.unwrap();
    assert_eq!(driver.session_id(), Some("s1"));
    let mut scraper = PageScraper::new(driver, settings());
    let ids = scraper.discover("A1").await.unwrap();
    assert_eq!(ids, vec!["P1", "P2"]);

    scraper.close().await.unwrap();
    // closing twice is a no-op
    scraper.close().await.unwrap();
    m_nav.assert_async().await;
    m_delete.assert_async().await;
}

#[tokio::test]
async fn absent_grid_times_out_per_artist() {
    let mut server = Server::new_async().await;
    let _m_session = mock_new_session(&mut server).await;
    let _m_nav = server
        .mock("POST", "/session/s1/url")
        .with_status(200)
        .with_body(json!({ "value": null }).to_string())
        .create_async()
        .await;
    let _m_grid = server
        .mock("POST", "/session/s1/element")
        .with_status(404)
        .with_body(json!({ "value": { "error": "no such element", "message": "", "stacktrace": "" } }).to_string())
        .create_async()
        .await;

    let driver = WebDriverSession::start(&server.url(), true).await.unwrap();
    let mut scraper = PageScraper::new(driver, settings());
    match scraper.discover("A1").await {
        Err(ScrapeError::RenderTimeout { artist_id, selector, .. }) => {
            assert_eq!(artist_id, "A1");
            assert_eq!(selector, "div[data-testid=grid-container]");
        }
        other => panic!("expected render timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn other_webdriver_errors_are_driver_errors() {
    let mut server = Server::new_async().await;
    let _m_session = mock_new_session(&mut server).await;
    let _m_nav = server
        .mock("POST", "/session/s1/url")
        .with_status(404)
        .with_body(json!({ "value": { "error": "invalid session id", "message": "" } }).to_string())
        .create_async()
        .await;

    let mut driver = WebDriverSession::start(&server.url(), true).await.unwrap();
    let err = driver.navigate("https://open.spotify.com/artist/A1/discovered-on").await.unwrap_err();
    assert!(format!("{}", err).contains("invalid session id"));
}

#[tokio::test]
async fn failed_session_start_is_an_error() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", "/session")
        .with_status(500)
        .with_body(json!({ "value": { "error": "session not created", "message": "chrome not reachable" } }).to_string())
        .create_async()
        .await;
    assert!(WebDriverSession::start(&server.url(), true).await.is_err());
}
