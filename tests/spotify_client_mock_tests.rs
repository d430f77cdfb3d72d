use discovered_on::api::spotify::SpotifyClient;
use discovered_on::api::spotify_auth::ClientCredentials;
use discovered_on::api::MetadataApi;
use discovered_on::error::ResolveError;
use discovered_on::resolver::MetadataResolver;
use mockito::{Matcher, Server};
use serde_json::json;

fn client(base: &str) -> SpotifyClient {
    SpotifyClient::with_endpoints(ClientCredentials::new("cid", "csecret"), base, base)
}

#[tokio::test]
async fn artist_lookup_uses_client_credentials_token() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let m_token = server
        .mock("POST", "/api/token")
        .match_header("authorization", "Basic Y2lkOmNzZWNyZXQ=")
        .match_body(Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "access_token": "app_token", "token_type": "Bearer", "expires_in": 3600 }).to_string())
        .expect(1)
        .create_async()
        .await;

    let m_artist = server
        .mock("GET", "/artists/A1")
        .match_header("authorization", "Bearer app_token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "A1", "name": "ArtistOne" }).to_string())
        .expect(2)
        .create_async()
        .await;

    let api = client(&base);
    assert_eq!(api.name(), "spotify");
    assert_eq!(api.artist_name("A1").await.unwrap(), "ArtistOne");
    // token is cached between calls
    assert_eq!(api.artist_name("A1").await.unwrap(), "ArtistOne");

    m_token.assert_async().await;
    m_artist.assert_async().await;
}

#[tokio::test]
async fn playlist_follows_track_pagination() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let _m_token = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "access_token": "t", "expires_in": 3600 }).to_string())
        .create_async()
        .await;

    let _m_playlist = server
        .mock("GET", "/playlists/P1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "P1",
                "uri": "spotify:playlist:P1",
                "name": "Fresh Finds",
                "description": "new music",
                "followers": { "href": null, "total": 4200 },
                "owner": { "display_name": "Spotify", "uri": "spotify:user:spotify" },
                "tracks": {
                    "items": [ { "added_at": "2022-01-01T00:00:00Z" } ],
                    "total": 2,
                    "next": format!("{}/playlists/P1/tracks?offset=1&limit=1", base)
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let m_page = server
        .mock("GET", "/playlists/P1/tracks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "items": [ { "added_at": "2024-02-03T04:05:06Z" } ], "total": 2, "next": null }).to_string())
        .expect(1)
        .create_async()
        .await;

    let resolver = MetadataResolver::new(client(&base));
    let record = resolver.resolve("P1").await.unwrap();
    m_page.assert_async().await;

    assert_eq!(record.name, "Fresh Finds");
    assert_eq!(record.description, "new music");
    assert_eq!(record.follower_count, 4200);
    assert_eq!(record.track_count, 2);
    assert_eq!(record.owner_name, "Spotify");
    assert_eq!(record.owner_follower_count, 0);
    assert_eq!(
        record.last_updated.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()).as_deref(),
        Some("2024-02-03 04:05:06")
    );
}

#[tokio::test]
async fn missing_playlist_is_a_fetch_failure() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let _m_token = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "access_token": "t", "expires_in": 3600 }).to_string())
        .create_async()
        .await;
    let _m_missing = server
        .mock("GET", "/playlists/GONE")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": { "status": 404, "message": "Resource not found" } }).to_string())
        .create_async()
        .await;

    let resolver = MetadataResolver::new(client(&base));
    match resolver.resolve("GONE").await {
        Err(ResolveError::FetchFailure { playlist_id, reason }) => {
            assert_eq!(playlist_id, "GONE");
            assert!(reason.contains("404"));
        }
        other => panic!("expected fetch failure, got {:?}", other),
    }
}

#[tokio::test]
async fn unauthorized_response_gets_one_token_retry() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let m_token = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "access_token": "t", "expires_in": 3600 }).to_string())
        .expect(2)
        .create_async()
        .await;
    let m_unauthorized = server
        .mock("GET", "/artists/A1")
        .with_status(401)
        .with_body(json!({ "error": { "status": 401, "message": "The access token expired" } }).to_string())
        .expect(2)
        .create_async()
        .await;

    let err = client(&base).artist_name("A1").await.unwrap_err();
    assert!(format!("{}", err).contains("401"));
    m_token.assert_async().await;
    m_unauthorized.assert_async().await;
}

#[tokio::test]
async fn token_failure_is_reported() {
    let mut server = Server::new_async().await;
    let base = server.url();
    let _m_token = server
        .mock("POST", "/api/token")
        .with_status(400)
        .with_body(json!({ "error": "invalid_client" }).to_string())
        .create_async()
        .await;

    let err = client(&base).artist_name("A1").await.unwrap_err();
    assert!(format!("{}", err).contains("token request failed"));
}
