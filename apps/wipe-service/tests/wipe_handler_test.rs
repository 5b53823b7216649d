//! ワイプ API のハンドラテスト
//!
//! インメモリストアでルーターを組み立て、HTTP 経由でステータスとレスポンスを検証する。

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value as JsonValue, json};
use thesisflow_domain::{clock::FixedClock, scope::ScopeResolver};
use thesisflow_infra::{
    mock::{InMemoryBlobStore, InMemoryDocumentStore, InMemoryIdentityProvider},
    wipe::{WipeConfig, WipeOrchestrator},
};
use thesisflow_wipe_service::{app, handler::WipeState, usecase::WipeUseCaseImpl};
use tower::ServiceExt;

const YEAR: &str = "year/2024-2025";

struct TestApp {
    router:    Router,
    documents: Arc<InMemoryDocumentStore>,
    identity:  Arc<InMemoryIdentityProvider>,
}

fn create_test_app() -> TestApp {
    let documents = Arc::new(InMemoryDocumentStore::new());
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap());
    let orchestrator = WipeOrchestrator::new(
        documents.clone(),
        identity.clone(),
        blobs,
        WipeConfig::default(),
    );
    let state = Arc::new(WipeState {
        usecase: WipeUseCaseImpl::new(ScopeResolver::new(Arc::new(clock)), orchestrator),
    });

    TestApp {
        router: app(state),
        documents,
        identity,
    }
}

fn wipe_request(uri: &str, body: Option<JsonValue>) -> Request<Body> {
    let builder = Request::builder().method(Method::POST).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// レスポンスボディを JSON として解析する
async fn parse_body(response: axum::http::Response<Body>) -> JsonValue {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_スコープ付きthesisワイプは200で結果を返す() {
    let t = create_test_app();
    let t1 = format!("{YEAR}/departments/cs/groups/g1/thesis/t1");
    t.documents.insert(t1.clone());
    t.documents.insert(format!("{t1}/chats/c1"));
    t.documents.insert(format!("{YEAR}/departments/math/groups/g2/thesis/t2"));

    let response = t
        .router
        .oneshot(wipe_request(
            "/internal/wipe",
            Some(json!({"category": "thesis", "department": "cs"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["data"]["category"], "thesis");
    assert_eq!(body["data"]["scope"], "cs");
    assert_eq!(body["data"]["year"], "2024-2025");
    assert_eq!(body["data"]["deleted_count"], 2);
    assert!(body["data"].get("identity").is_none());
    assert_eq!(
        t.documents.paths(),
        vec![format!("{YEAR}/departments/math/groups/g2/thesis/t2")]
    );
}

#[tokio::test]
async fn test_ボディがなければクエリ文字列のパラメータを使う() {
    let t = create_test_app();
    t.documents.insert(format!("{YEAR}/departments/cs/users/u1"));
    t.identity.add_account("uid-1");

    let response = t
        .router
        .oneshot(wipe_request("/internal/wipe?category=user", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["data"]["scope"], "all");
    assert_eq!(body["data"]["identity"]["succeeded"], 1);
    assert!(t.documents.is_empty());
}

#[tokio::test]
async fn test_ボディのカテゴリがクエリより優先される() {
    let t = create_test_app();
    t.documents.insert("systemAudits/a1");
    t.documents.insert(format!("{YEAR}/departments/cs/users/u1"));

    let response = t
        .router
        .oneshot(wipe_request(
            "/internal/wipe?category=user",
            Some(json!({"category": "audit"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["data"]["category"], "audit");
    assert_eq!(
        t.documents.paths(),
        vec![format!("{YEAR}/departments/cs/users/u1")]
    );
}

#[tokio::test]
async fn test_検証エラーは400で何も削除しない() {
    let cases = [
        ("/internal/wipe", Some(json!({}))),
        ("/internal/wipe?category=everything", None),
        (
            "/internal/wipe",
            Some(json!({"category": "thesis", "course": "bscs"})),
        ),
    ];

    for (uri, body) in cases {
        let t = create_test_app();
        t.documents.insert(format!("{YEAR}/departments/cs/groups/g1/thesis/t1"));

        let response = t.router.oneshot(wipe_request(uri, body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = parse_body(response).await;
        assert_eq!(body["status"], 400);
        assert_eq!(t.documents.query_count(), 0);
        assert_eq!(t.documents.len(), 1);
    }
}

#[tokio::test]
async fn test_不正なjsonボディは400() {
    let t = create_test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/internal/wipe")
        .header("content-type", "application/json")
        .body(Body::from("{category"))
        .unwrap();

    let response = t.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.documents.query_count(), 0);
}

#[tokio::test]
async fn test_解析できないクエリ文字列はエラーレスポンス形式の400() {
    let t = create_test_app();

    let response = t
        .router
        .oneshot(wipe_request(
            "/internal/wipe?category=thesis&category=user",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(response).await;
    assert_eq!(body["status"], 400);
    assert!(body["detail"].as_str().unwrap().contains("クエリ文字列"));
    assert_eq!(t.documents.query_count(), 0);
}

#[tokio::test]
async fn test_ステップ失敗は500で再実行を案内する() {
    let t = create_test_app();
    t.documents.fail_queries();

    let response = t
        .router
        .oneshot(wipe_request("/internal/wipe?category=audit", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("再実行"));
}

#[tokio::test]
async fn test_ヘルスチェックはhealthyを返す() {
    let t = create_test_app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = t.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["status"], "healthy");
}
