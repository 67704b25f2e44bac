mod support;

use festnews::server::{build_rocket, AppState};
use festnews::{ArticleStore, Cache, FetchError};
use rocket::http::{Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use support::{article, ScriptedSource};

async fn client_with(source: Arc<ScriptedSource>, static_dir: PathBuf) -> Client {
    let store = ArticleStore::new(Arc::new(Cache::new()), source, std::time::Duration::from_secs(1800));
    let topics = vec!["all".to_string(), "cannes".to_string(), "sxsw".to_string()];
    let state = AppState::new(store, 12, static_dir, topics);
    Client::tracked(build_rocket(state, rocket::Config::figment()))
        .await
        .expect("valid rocket instance")
}

fn no_static() -> PathBuf {
    PathBuf::from("does-not-exist")
}

fn fourteen() -> Vec<festnews::Article> {
    (0..14).map(|i| article(i, 1 + i as u32, 1000 + i as u32)).collect()
}

#[rocket::async_test]
async fn pages_through_a_topic() {
    let source = Arc::new(ScriptedSource::new(vec![Ok(fourteen())]));
    let client = client_with(source.clone(), no_static()).await;

    let response = client.get("/api/news/cannes?page=1&sort=latest").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("json body");
    let articles = body["articles"].as_array().expect("articles array");
    assert_eq!(articles.len(), 12);
    assert_eq!(articles[0]["id"], "story-13");
    assert_eq!(articles[0]["date"], "2024-05-14");
    assert_eq!(articles[0]["title_en"], "Festival story 13");
    assert_eq!(articles[0]["title_cn"], "电影节新闻 13");
    assert!(articles[0]["views"].is_u64());
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["has_more"], true);
    assert_eq!(body["meta"]["total"], 14);

    let body: Value = client
        .get("/api/news/cannes?page=2&sort=latest")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("json body");
    assert_eq!(body["articles"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["has_more"], false);

    let body: Value = client
        .get("/api/news/cannes?page=3")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("json body");
    assert!(body["articles"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["has_more"], false);

    // All three requests were served from one fetch.
    assert_eq!(source.calls(), 1);
}

#[rocket::async_test]
async fn hottest_sort_orders_by_views() {
    let source = Arc::new(ScriptedSource::new(vec![Ok(fourteen())]));
    let client = client_with(source, no_static()).await;

    let body: Value = client
        .get("/api/news/cannes?sort=hottest")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("json body");
    let views: Vec<u64> = body["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["views"].as_u64().unwrap())
        .collect();
    assert!(views.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(views[0], 1013);
}

#[rocket::async_test]
async fn empty_first_fetch_is_not_an_error() {
    let source = Arc::new(ScriptedSource::new(vec![Err(FetchError::Empty)]));
    let client = client_with(source, no_static()).await;

    let response = client.get("/api/news/sxsw").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("json body");
    assert!(body["articles"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["total"], 0);
    assert_eq!(body["meta"]["has_more"], false);
}

#[rocket::async_test]
async fn malformed_parameters_are_bad_requests() {
    let source = Arc::new(ScriptedSource::new(vec![Ok(fourteen())]));
    let client = client_with(source.clone(), no_static()).await;

    for (uri, kind) in [
        ("/api/news/cannes?page=zero", "invalid_page"),
        ("/api/news/cannes?page=0", "invalid_page"),
        ("/api/news/cannes?sort=oldest", "invalid_sort"),
    ] {
        let response = client.get(uri).dispatch().await;
        assert_eq!(response.status(), Status::BadRequest, "{}", uri);
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["error"], kind);
        assert!(body["message"].is_string());
    }

    // Rejected before touching the cache.
    assert_eq!(source.calls(), 0);
}

#[rocket::async_test]
async fn unknown_route_is_json_404() {
    let source = Arc::new(ScriptedSource::new(vec![]));
    let client = client_with(source, no_static()).await;

    let response = client.get("/api/nope").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["error"], "not_found");
}

#[rocket::async_test]
async fn status_reports_cached_topics() {
    let source = Arc::new(ScriptedSource::new(vec![Ok(fourteen())]));
    let client = client_with(source, no_static()).await;

    client.get("/api/news/Cannes").dispatch().await;

    let body: Value = client.get("/api/status").dispatch().await.into_json().await.expect("json body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cached_topics"][0]["topic"], "cannes");
    assert_eq!(body["cached_topics"][0]["articles"], 14);

    let body: Value = client.get("/api/topics").dispatch().await.into_json().await.expect("json body");
    assert_eq!(body["topics"].as_array().unwrap().len(), 3);

    let response = client.get("/health").dispatch().await;
    assert_eq!(response.into_string().await.as_deref(), Some("OK"));
}

#[rocket::async_test]
async fn serves_landing_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("index.html"), "<h1>Festival News</h1>").expect("write index");
    std::fs::write(dir.path().join("app.js"), "console.log('hi');").expect("write asset");

    let source = Arc::new(ScriptedSource::new(vec![]));
    let client = client_with(source, dir.path().to_path_buf()).await;

    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().await.as_deref(), Some("<h1>Festival News</h1>"));

    let response = client.get("/static/app.js").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
}

#[rocket::async_test]
async fn api_allows_cross_origin_requests() {
    let source = Arc::new(ScriptedSource::new(vec![Ok(fourteen())]));
    let client = client_with(source, no_static()).await;

    let response = client
        .get("/api/news/venice")
        .header(Header::new("Origin", "https://festival.example"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("*"));

    let response = client
        .options("/api/news/venice?page=2")
        .header(Header::new("Origin", "https://festival.example"))
        .header(Header::new("Access-Control-Request-Method", "GET"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("*"));
    assert!(response
        .headers()
        .get_one("Access-Control-Allow-Methods")
        .is_some_and(|m| m.contains("GET")));

    // Error bodies carry the header too.
    let response = client.get("/api/news/venice?page=0").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("*"));
}
