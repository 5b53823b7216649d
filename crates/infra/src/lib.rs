//! # ThesisFlow インフラ層
//!
//! 外部ストアとの通信と、それらを横断するワイプ（スコープ付き一括削除）処理。
//!
//! ## 責務
//!
//! - **ストアの抽象化**: [`store`] のトレイトでドキュメントストア・認証サービス・
//!   ファイルストレージを抽象化する
//! - **ストア実装**: DynamoDB（[`dynamodb`]）、Identity Service（[`identity`]）、
//!   S3（[`s3`]）
//! - **ワイプ処理**: [`wipe`] の削除プリミティブとオーケストレーター
//!
//! ## 依存関係
//!
//! ```text
//! wipe-service → infra → domain
//!       ↘
//!         shared
//! ```
//!
//! 削除計画・スコープ解決などの判断はドメイン層が持ち、このクレートは
//! それを外部ストアへの呼び出しに変換する。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use thesisflow_infra::{dynamodb, identity, s3, wipe::{WipeConfig, WipeOrchestrator}};
//!
//! async fn setup() -> WipeOrchestrator {
//!     let documents = dynamodb::DynamoDbDocumentStore::new(
//!         dynamodb::create_client(Some("http://localhost:18000")).await,
//!         "documents".to_string(),
//!     );
//!     let blobs = s3::S3BlobStore::new(s3::create_client(None).await, "thesis-files".to_string());
//!     let accounts = identity::HttpIdentityClient::new("http://localhost:13010");
//!
//!     WipeOrchestrator::new(
//!         Arc::new(documents),
//!         Arc::new(accounts),
//!         Arc::new(blobs),
//!         WipeConfig::default(),
//!     )
//! }
//! ```

pub mod dynamodb;
pub mod error;
pub mod identity;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod s3;
pub mod store;
pub mod wipe;

pub use error::InfraError;
