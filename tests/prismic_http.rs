//! PrismicClient against a local fake of the Prismic REST API

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spacetraveling::cms::{CancelToken, CmsError, PageDataProvider, PrismicClient};
use spacetraveling::config::CmsConfig;
use spacetraveling::SpaceTraveling;

struct Fake {
    base: String,
    api_hits: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl Fake {
    fn record(&self, raw: Option<String>) {
        self.queries.lock().unwrap().push(raw.unwrap_or_default());
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

async fn spawn_fake() -> Arc<Fake> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let fake = Arc::new(Fake {
        base: format!("http://{}", addr),
        api_hits: AtomicUsize::new(0),
        queries: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/:mode/api/v2", get(api_info))
        .route("/:mode/api/v2/documents/search", get(search))
        .with_state(fake.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    fake
}

fn client(fake: &Fake, mode: &str, token: Option<&str>, timeout_secs: u64) -> PrismicClient {
    let config = CmsConfig {
        endpoint: Some(format!("{}/{}/api/v2/", fake.base, mode)),
        access_token: token.map(str::to_string),
        timeout_secs,
        ..CmsConfig::default()
    };
    PrismicClient::new(&config).unwrap()
}

async fn api_info(
    State(fake): State<Arc<Fake>>,
    Path(mode): Path<String>,
    RawQuery(raw): RawQuery,
) -> Json<Value> {
    fake.api_hits.fetch_add(1, Ordering::SeqCst);
    fake.record(raw);

    if mode == "noref" {
        return Json(json!({
            "refs": [{ "id": "preview", "ref": "PREVIEW", "isMasterRef": false }]
        }));
    }
    Json(json!({
        "refs": [{ "id": "master", "ref": "REF1", "label": "Master", "isMasterRef": true }],
        "types": { "custom-post": "Post" }
    }))
}

async fn search(
    State(fake): State<Arc<Fake>>,
    Path(mode): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    RawQuery(raw): RawQuery,
) -> Response {
    fake.record(raw);

    if params.get("ref").map(String::as_str) != Some("REF1") {
        return (StatusCode::BAD_REQUEST, "missing ref").into_response();
    }
    match mode.as_str() {
        "error" => return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "legacy" => return Json(json!({ "page": 1, "results": [] })).into_response(),
        "slow" => tokio::time::sleep(Duration::from_secs(3)).await,
        _ => {}
    }

    let q = params.get("q").cloned().unwrap_or_default();
    if q.starts_with("[[at(my.custom-post.uid,") {
        let uid = q
            .rsplit_once(",\"")
            .map(|(_, rest)| rest.trim_end_matches("\")]]"))
            .unwrap_or_default();
        let results = match uid {
            "first-post" | "second-post" => vec![post_document(uid)],
            _ => vec![],
        };
        return Json(json!({ "page": 1, "next_page": null, "results": results })).into_response();
    }

    let page: u32 = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let body = if page == 1 {
        assert_eq!(q, r#"[[at(document.type,"custom-post")]]"#);
        json!({
            "page": 1,
            "results_per_page": 1,
            "total_pages": 2,
            "next_page": format!(
                "{}/{}/api/v2/documents/search?ref=REF1&page=2&pageSize=1",
                fake.base, mode
            ),
            "prev_page": null,
            "results": [summary_document("first-post", "2021-03-15T19:25:28+0000")]
        })
    } else {
        json!({
            "page": 2,
            "next_page": null,
            "results": [summary_document("second-post", "2021-03-25T19:25:28+0000")]
        })
    };
    Json(body).into_response()
}

fn summary_document(uid: &str, published: &str) -> Value {
    json!({
        "id": format!("ID-{}", uid),
        "uid": uid,
        "type": "custom-post",
        "first_publication_date": published,
        "data": {
            "title": format!("Title {}", uid),
            "subtitle": "Subtitle",
            "author": "Joseph Oliveira"
        }
    })
}

fn post_document(uid: &str) -> Value {
    json!({
        "id": format!("ID-{}", uid),
        "uid": uid,
        "type": "custom-post",
        "first_publication_date": "2021-03-25T19:25:28+0000",
        "data": {
            "title": format!("Title {}", uid),
            "subtitle": "Subtitle",
            "author": "Joseph Oliveira",
            "banner": { "url": "https://images.prismic.io/banner.png" },
            "content": [{
                "heading": "Intro",
                "body": [{ "type": "paragraph", "text": "hello world test", "spans": [] }]
            }]
        }
    })
}

#[tokio::test]
async fn test_first_page_and_cursor() {
    let fake = spawn_fake().await;
    let client = client(&fake, "ok", None, 10);
    let cancel = CancelToken::new();

    let first = client.first_page(&cancel).await.unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.items[0].id, "first-post");
    assert_eq!(first.items[0].author, "Joseph Oliveira");
    assert!(first.has_next());

    let cursor = first.next_cursor.unwrap();
    let second = client.page(&cursor, &cancel).await.unwrap();
    assert_eq!(second.page, 2);
    assert_eq!(second.items[0].id, "second-post");
    assert!(!second.has_next());

    assert!(fake.queries()[1].contains("pageSize=1"));
}

#[tokio::test]
async fn test_master_ref_is_fetched_once() {
    let fake = spawn_fake().await;
    let client = client(&fake, "ok", None, 10);
    let cancel = CancelToken::new();

    client.first_page(&cancel).await.unwrap();
    client.article("first-post", &cancel).await.unwrap();
    client.article("second-post", &cancel).await.unwrap();

    assert_eq!(fake.api_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_article_by_uid() {
    let fake = spawn_fake().await;
    let client = client(&fake, "ok", None, 10);

    let article = client
        .article("first-post", &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(article.uid, "first-post");
    assert_eq!(article.banner_url, "https://images.prismic.io/banner.png");
    assert_eq!(article.content.len(), 1);
    assert_eq!(article.content[0].heading, "Intro");
    assert_eq!(article.content[0].body[0].text(), "hello world test");
}

#[tokio::test]
async fn test_unknown_article_is_not_found() {
    let fake = spawn_fake().await;
    let client = client(&fake, "ok", None, 10);

    let result = client.article("missing", &CancelToken::new()).await;
    assert!(matches!(result, Err(CmsError::NotFound(uid)) if uid == "missing"));
}

#[tokio::test]
async fn test_access_token_is_appended() {
    let fake = spawn_fake().await;
    let client = client(&fake, "ok", Some("secret"), 10);
    let cancel = CancelToken::new();

    let first = client.first_page(&cancel).await.unwrap();
    client
        .page(first.next_cursor.as_deref().unwrap(), &cancel)
        .await
        .unwrap();

    let queries = fake.queries();
    assert_eq!(queries.len(), 3);
    for query in queries {
        assert_eq!(query.matches("access_token=secret").count(), 1, "{}", query);
    }
}

#[tokio::test]
async fn test_server_error_is_status() {
    let fake = spawn_fake().await;
    let client = client(&fake, "error", Some("secret"), 10);

    match client.first_page(&CancelToken::new()).await {
        Err(CmsError::Status { status, url }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/error/api/v2/documents/search"));
            assert!(!url.contains("secret"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_next_page_is_malformed() {
    let fake = spawn_fake().await;
    let client = client(&fake, "legacy", None, 10);

    let result = client.first_page(&CancelToken::new()).await;
    assert!(matches!(result, Err(CmsError::Malformed(_))));
}

#[tokio::test]
async fn test_missing_master_ref() {
    let fake = spawn_fake().await;
    let client = client(&fake, "noref", None, 10);

    let result = client.first_page(&CancelToken::new()).await;
    assert!(matches!(result, Err(CmsError::NoMasterRef)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let fake = spawn_fake().await;
    let client = client(&fake, "slow", None, 1);

    let result = client.first_page(&CancelToken::new()).await;
    assert!(matches!(result, Err(CmsError::Timeout(_))));
}

#[tokio::test]
async fn test_zero_timeout_still_fetches() {
    let fake = spawn_fake().await;
    let client = client(&fake, "ok", None, 0);

    let first = client.first_page(&CancelToken::new()).await.unwrap();
    assert_eq!(first.items[0].id, "first-post");
}

#[tokio::test]
async fn test_cancel_in_flight_request() {
    let fake = spawn_fake().await;
    let client = client(&fake, "slow", None, 10);
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = client.first_page(&cancel).await;
    assert!(matches!(result, Err(CmsError::Cancelled)));
}

#[tokio::test]
async fn test_generate_site_over_http() {
    let fake = spawn_fake().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("_config.yml"),
        format!("cms:\n  endpoint: {}/ok/api/v2\n", fake.base),
    )
    .unwrap();

    let mut site = SpaceTraveling::new(dir.path()).unwrap();
    // the environment may carry a real endpoint
    site.config.cms.endpoint = Some(format!("{}/ok/api/v2", fake.base));
    site.config.cms.access_token = None;

    let report = site.generate(&CancelToken::new()).await.unwrap();
    assert_eq!(report.listing_pages, 2);
    assert_eq!(report.posts, 2);
    assert_eq!(report.skipped_posts, 0);

    let index = std::fs::read_to_string(site.public_dir.join("index.html")).unwrap();
    assert!(index.contains("Title first-post"));
    assert!(index.contains("15 mar 2021"));
    assert!(index.contains("Carregar mais posts"));

    let page2 = std::fs::read_to_string(site.public_dir.join("page/2/index.html")).unwrap();
    assert!(page2.contains("Title first-post"));
    assert!(page2.contains("Title second-post"));
    assert!(!page2.contains("Carregar mais posts"));

    let post =
        std::fs::read_to_string(site.public_dir.join("post/second-post/index.html")).unwrap();
    assert!(post.contains("25 mar 2021"));
    assert!(post.contains("1 min"));
    assert!(post.contains("<p>hello world test</p>"));
}
