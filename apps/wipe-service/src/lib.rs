//! # Wipe Service ライブラリ
//!
//! 管理用のスコープ付き一括削除サービス。
//! ルーター構築を公開し、バイナリと統合テストの両方から使う。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use handler::{WipeState, health_check, wipe};
use tower_http::trace::TraceLayer;

/// ルーターを構築する
pub fn app(state: Arc<WipeState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/internal/wipe", post(wipe))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
