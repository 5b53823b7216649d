//! # インフラ層エラー定義
//!
//! ドキュメントストア・認証サービス・ファイルストレージとの通信で発生するエラー。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターン:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別
//!
//! convenience constructor でエラーを生成すると、その時点のスパン（どのワイプの
//! どのコレクションで失敗したか）が自動的に記録される。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// DynamoDB エラー
    ///
    /// AWS SDK のエラー型はジェネリクスが深く `#[from]` が困難なため、
    /// 手動で String にマップする。
    #[error("DynamoDB エラー: {0}")]
    DynamoDb(String),

    /// S3 エラー
    #[error("S3 エラー: {0}")]
    S3(String),

    /// 認証サービスエラー
    #[error("認証サービスエラー: {0}")]
    Identity(String),

    /// 認証サービスが一時的に利用できない
    #[error("認証サービスが一時的に利用できません")]
    IdentityUnavailable,

    /// グループ削除の反復上限超過
    ///
    /// ストアがページを進めず同じ非一致ページを返し続けた可能性がある。
    /// 黙って打ち切らず、ステップ失敗として報告する。
    #[error(
        "コレクション {collection} の削除が反復上限 {iterations} 回に達しました（ページングが進んでいない可能性があります）"
    )]
    IterationLimitExceeded {
        /// コレクション名
        collection: String,
        /// 実行した反復回数
        iterations: u32,
    },

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    fn capture(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    // ===== Convenience constructors =====

    /// DynamoDB エラーを生成する
    pub fn dynamo_db(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::DynamoDb(msg.into()))
    }

    /// S3 エラーを生成する
    pub fn s3(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::S3(msg.into()))
    }

    /// 認証サービスエラーを生成する
    pub fn identity(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Identity(msg.into()))
    }

    /// 認証サービス利用不可エラーを生成する
    pub fn identity_unavailable() -> Self {
        Self::capture(InfraErrorKind::IdentityUnavailable)
    }

    /// 反復上限超過エラーを生成する
    pub fn iteration_limit_exceeded(collection: impl Into<String>, iterations: u32) -> Self {
        Self::capture(InfraErrorKind::IterationLimitExceeded {
            collection: collection.into(),
            iterations,
        })
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Unexpected(msg.into()))
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::identity_unavailable()
        } else {
            Self::identity(err.to_string())
        }
    }
}
