//! # Wipe Service サーバー
//!
//! 管理者向けの内部サービス。カテゴリ単位のデータを学年度・学科・コースで絞り込んで削除する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `WIPE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `WIPE_PORT` | **Yes** | ポート番号 |
//! | `DYNAMODB_ENDPOINT` | No | DynamoDB エンドポイント（DynamoDB Local 用） |
//! | `DOCUMENTS_TABLE_NAME` | No | ドキュメントテーブル名（デフォルト: `documents`） |
//! | `S3_ENDPOINT_URL` | No | S3 エンドポイント（MinIO 用） |
//! | `S3_BUCKET_NAME` | **Yes** | ファイル実体のバケット名 |
//! | `IDENTITY_SERVICE_URL` | **Yes** | Identity Service のベース URL |
//! | `WIPE_BATCH_SIZE` | No | 1 バッチの件数（1〜500、デフォルト: 500） |
//! | `WIPE_IDENTITY_PAGE_SIZE` | No | 認証アカウント一覧の 1 ページの件数（1〜1000） |
//! | `WIPE_MAX_GROUP_ITERATIONS` | No | グループ削除の取得回数上限（デフォルト: 10000） |
//! | `LOG_FORMAT` | No | `json` で JSON 形式のログを出力 |
//!
//! ## 起動方法
//!
//! ```bash
//! WIPE_PORT=13020 S3_BUCKET_NAME=thesis-files IDENTITY_SERVICE_URL=http://localhost:13010 \
//!     cargo run -p thesisflow-wipe-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use thesisflow_domain::{clock::SystemClock, scope::ScopeResolver};
use thesisflow_infra::{
    dynamodb::{self, DynamoDbDocumentStore},
    identity::HttpIdentityClient,
    s3::{self, S3BlobStore},
    wipe::WipeOrchestrator,
};
use thesisflow_shared::observability::{TracingConfig, init_tracing};
use thesisflow_wipe_service::{
    app,
    config::WipeServiceConfig,
    handler::WipeState,
    usecase::WipeUseCaseImpl,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("wipe-service"));

    let config = WipeServiceConfig::from_env()?;

    tracing::info!(
        "Wipe Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let dynamodb_client = dynamodb::create_client(config.dynamodb_endpoint.as_deref()).await;
    dynamodb::ensure_document_table(&dynamodb_client, &config.documents_table_name).await?;
    let documents = Arc::new(DynamoDbDocumentStore::new(
        dynamodb_client,
        config.documents_table_name.clone(),
    ));

    let s3_client = s3::create_client(config.s3_endpoint_url.as_deref()).await;
    let blobs = Arc::new(S3BlobStore::new(s3_client, config.s3_bucket_name.clone()));

    let identity = Arc::new(HttpIdentityClient::new(&config.identity_service_url));

    let orchestrator = WipeOrchestrator::new(documents, identity, blobs, config.wipe);
    let resolver = ScopeResolver::new(Arc::new(SystemClock));
    let state = Arc::new(WipeState {
        usecase: WipeUseCaseImpl::new(resolver, orchestrator),
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Wipe Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
