//! Identity Service クライアントのテスト
//!
//! ローカルポートで最小限の Identity Service を起動し、
//! [`HttpIdentityClient`] のリクエスト・レスポンス変換を検証する。

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use thesisflow_infra::{
    error::InfraErrorKind,
    identity::HttpIdentityClient,
    store::{BulkDeleteFailure, IdentityProvider},
};

#[derive(Default)]
struct Recorded {
    list_queries: Vec<HashMap<String, String>>,
    bulk_bodies:  Vec<Value>,
}

type Shared = Arc<Mutex<Recorded>>;

async fn list_accounts(
    State(recorded): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let has_token = query.contains_key("page_token");
    recorded.lock().unwrap().list_queries.push(query);

    if has_token {
        Json(json!({ "account_ids": ["uid-3"] }))
    } else {
        Json(json!({ "account_ids": ["uid-1", "uid-2"], "next_page_token": "tok-1" }))
    }
}

async fn bulk_delete(State(recorded): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    recorded.lock().unwrap().bulk_bodies.push(body);
    Json(json!({
        "success_count": 1,
        "errors": [{ "index": 1, "message": "user not found" }]
    }))
}

/// テスト用サーバーを起動し、ベース URL を返す
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// プロキシ設定の影響を受けないクライアント
fn client(base_url: &str) -> HttpIdentityClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpIdentityClient::with_client(base_url, http)
}

async fn fake_identity_service() -> (String, Shared) {
    let recorded = Shared::default();
    let router = Router::new()
        .route("/internal/accounts", get(list_accounts))
        .route("/internal/accounts/bulk-delete", post(bulk_delete))
        .with_state(recorded.clone());
    (spawn_server(router).await, recorded)
}

#[tokio::test]
async fn test_list_accountsがページサイズとカーソルを送る() {
    let (base_url, recorded) = fake_identity_service().await;
    let sut = client(&format!("{base_url}/"));

    let first = sut.list_accounts(2, None).await.unwrap();
    let second = sut.list_accounts(2, Some("tok-1")).await.unwrap();

    assert_eq!(first.account_ids, vec!["uid-1", "uid-2"]);
    assert_eq!(first.next_cursor.as_deref(), Some("tok-1"));
    assert_eq!(second.account_ids, vec!["uid-3"]);
    assert_eq!(second.next_cursor, None);

    let queries = recorded.lock().unwrap().list_queries.clone();
    assert_eq!(queries[0], params(&[("page_size", "2")]));
    assert_eq!(
        queries[1],
        params(&[("page_size", "2"), ("page_token", "tok-1")])
    );
}

#[tokio::test]
async fn test_bulk_deleteが個別の失敗をインデックス付きで返す() {
    let (base_url, recorded) = fake_identity_service().await;
    let sut = client(&base_url);
    let ids = vec!["uid-1".to_string(), "uid-2".to_string()];

    let response = sut.bulk_delete(&ids).await.unwrap();

    assert_eq!(response.success_count, 1);
    assert_eq!(
        response.failures,
        vec![BulkDeleteFailure {
            index:   1,
            message: "user not found".to_string(),
        }]
    );
    assert_eq!(
        recorded.lock().unwrap().bulk_bodies[0],
        json!({ "ids": ["uid-1", "uid-2"] })
    );
}

#[tokio::test]
async fn test_503はidentity_unavailableになる() {
    let router = Router::new().route(
        "/internal/accounts",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let sut = client(&spawn_server(router).await);

    let err = sut.list_accounts(10, None).await.unwrap_err();

    assert!(matches!(err.kind(), InfraErrorKind::IdentityUnavailable));
}

#[tokio::test]
async fn test_想定外のステータスは本文付きのエラーになる() {
    let router = Router::new().route(
        "/internal/accounts/bulk-delete",
        post(|| async { (StatusCode::BAD_REQUEST, "too many ids") }),
    );
    let sut = client(&spawn_server(router).await);

    let err = sut.bulk_delete(&["uid-1".to_string()]).await.unwrap_err();

    assert!(matches!(err.kind(), InfraErrorKind::Identity(msg) if msg.contains("too many ids")));
}

#[tokio::test]
async fn test_接続できない場合はidentity_unavailableになる() {
    // 一度確保したポートを解放して、接続拒否されるアドレスを作る
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let sut = client(&format!("http://{addr}"));

    let err = sut.list_accounts(10, None).await.unwrap_err();

    assert!(matches!(err.kind(), InfraErrorKind::IdentityUnavailable));
}
