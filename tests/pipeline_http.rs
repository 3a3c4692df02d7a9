use std::{collections::HashSet, time::Duration};

use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use youtify::{
    ConfigBuilder, Pipeline, Query,
    clients::{CatalogClient, errors::Error, retry::RetryPolicy},
    resolver::Resolver,
};

const TOKEN: &str = "test-token";

fn track(name: &str, artists: &[&str]) -> Value {
    json!({
        "name": name,
        "artists": artists.iter().map(|a| json!({"name": a})).collect::<Vec<_>>(),
        "external_urls": {"spotify": format!("https://open.spotify.com/track/{name}")},
    })
}

fn pipeline(server: &MockServer) -> Pipeline<CatalogClient> {
    let client = CatalogClient::new(Duration::from_secs(5), RetryPolicy::none()).unwrap();
    Pipeline::new(Resolver::with_api_base(client, format!("{}/v1", server.uri())), 1)
}

fn as_strs(queries: &HashSet<Query>) -> Vec<&str> {
    let mut queries: Vec<_> = queries.iter().map(Query::as_str).collect();
    queries.sort_unstable();
    queries
}

async fn mount_page(server: &MockServer, page_path: &str, items: Vec<Value>, next: Option<String>) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": items, "next": next})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn album_pages_are_fetched_exactly_once_each() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/albums/abc/tracks"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track("One", &["A"]), track("Two", &["A"])],
            "next": format!("{}/pages/2", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/pages/2",
        vec![track("Three", &["A", "B"])],
        Some(format!("{}/pages/3", server.uri())),
    )
    .await;
    mount_page(&server, "/pages/3", vec![track("Four", &["B"])], None).await;

    let queries = pipeline(&server)
        .run(["https://open.spotify.com/album/abc"], TOKEN)
        .await
        .unwrap();

    assert_eq!(
        as_strs(&queries),
        vec![
            "search: Four B",
            "search: One A",
            "search: Three A, B",
            "search: Two A"
        ]
    );
}

#[tokio::test]
async fn failing_second_page_keeps_first_page() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/v1/albums/abc/tracks",
        vec![track("One", &["A"])],
        Some(format!("{}/pages/2", server.uri())),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/pages/2"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": {"status": 404, "message": "Not found."}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pages/3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let queries = pipeline(&server)
        .run(["https://open.spotify.com/album/abc"], TOKEN)
        .await
        .unwrap();
    assert_eq!(as_strs(&queries), vec!["search: One A"]);
}

#[tokio::test]
async fn mixed_batch_is_deduplicated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track("Song", &["A", "B"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/p1/tracks"))
        .and(query_param(
            "fields",
            "items(track(artists.name,external_urls.spotify,name)),next",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"track": track("Song", &["A", "B"])}, {"track": track("Else", &["C"])}],
            "next": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let queries = pipeline(&server)
        .run(
            [
                "https://open.spotify.com/track/t1?si=x",
                "https://open.spotify.com/playlist/p1",
                "https://open.spotify.com/track/t1?si=x",
                "https://open.spotify.com/show/123",
            ],
            TOKEN,
        )
        .await
        .unwrap();
    assert_eq!(as_strs(&queries), vec!["search: Else C", "search: Song A, B"]);
}

#[tokio::test]
async fn every_fetch_failing_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"status": 401, "message": "Invalid access token"}})),
        )
        .mount(&server)
        .await;

    let err = pipeline(&server)
        .run(
            [
                "https://open.spotify.com/track/t1",
                "https://open.spotify.com/album/a1",
                "https://open.spotify.com/playlist/p1",
            ],
            TOKEN,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyResult));
}

#[tokio::test]
async fn pipeline_from_config_uses_api_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track("Song", &["A"])))
        .expect(1)
        .mount(&server)
        .await;

    let config = ConfigBuilder::new()
        .api_base(format!("{}/v1", server.uri()))
        .max_attempts(Some(1))
        .build()
        .unwrap();
    let queries = Pipeline::try_from_config(&config)
        .unwrap()
        .run(["https://open.spotify.com/track/t1"], TOKEN)
        .await
        .unwrap();
    assert_eq!(as_strs(&queries), vec!["search: Song A"]);
}
