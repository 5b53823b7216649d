//! # ThesisFlow 共有ユーティリティ
//!
//! データ削除サービスとその周辺クレートで共通利用するユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - domain / infra / wipe-service のすべてから依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum などの Web フレームワークには依存しない

pub mod api_response;
pub mod error_response;
pub mod health;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::HealthResponse;
