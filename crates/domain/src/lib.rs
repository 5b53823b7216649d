//! # ThesisFlow ドメイン層
//!
//! 学年度・学科・コース単位で階層化されたデータを一括削除（ワイプ）するための
//! ドメインモデルを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! wipe-service → infra → domain
//! ```
//!
//! ドメイン層はデータストア・外部サービスに一切依存しない。
//! 削除対象の決定（カテゴリ → 計画、リクエスト → スコープ）はすべてここで行い、
//! 実際の削除はインフラ層に任せる。
//!
//! ## モジュール構成
//!
//! - [`category`] - ワイプ対象カテゴリ
//! - [`clock`] - 時刻プロバイダと学年度ラベル
//! - [`error`] - ドメインエラー
//! - [`plan`] - カテゴリごとの静的な削除計画
//! - [`scope`] - スコープ解決とパスプレフィックス
//!
//! ## 使用例
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::{TimeZone, Utc};
//! use thesisflow_domain::{
//!     clock::FixedClock,
//!     scope::{ScopeInput, ScopeResolver},
//! };
//!
//! let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap());
//! let resolver = ScopeResolver::new(Arc::new(clock));
//!
//! let scope = resolver
//!     .resolve(ScopeInput {
//!         department: Some("Computer Science".to_string()),
//!         ..ScopeInput::default()
//!     })
//!     .unwrap();
//!
//! assert_eq!(
//!     scope.path_prefix().as_str(),
//!     "year/2024-2025/departments/computer-science"
//! );
//! ```

pub mod category;
pub mod clock;
pub mod error;
pub mod plan;
pub mod scope;

pub use category::Category;
pub use error::DomainError;
