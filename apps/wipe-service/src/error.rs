//! # Wipe Service エラー定義
//!
//! Wipe Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! | エラー | ステータス | 発生箇所 |
//! |--------|-----------|----------|
//! | `BadRequest` | 400 | リクエストボディの JSON が不正 |
//! | `Validation` | 400 | カテゴリ・スコープの検証（ストアへのアクセス前） |
//! | `StepFailed` | 500 | ドキュメントストア・認証サービスのステップ失敗 |
//! | `StepFailed`（認証サービス停止） | 503 | 認証サービスに接続できない |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thesisflow_domain::DomainError;
use thesisflow_infra::{error::InfraErrorKind, wipe::WipeStepFailure};
use thesisflow_shared::ErrorResponse;
use thiserror::Error;

/// Wipe Service で発生するエラー
#[derive(Debug, Error)]
pub enum WipeServiceError {
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 入力検証エラー
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// ワイプのステップ失敗
    #[error(transparent)]
    StepFailed(#[from] WipeStepFailure),
}

impl IntoResponse for WipeServiceError {
    fn into_response(self) -> Response {
        let body = match &self {
            WipeServiceError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
            WipeServiceError::Validation(DomainError::Validation(msg)) => {
                ErrorResponse::validation_error(msg.clone())
            }
            WipeServiceError::StepFailed(failure) => {
                tracing::error!(
                    step = %failure.step,
                    completed_steps = failure.completed_steps,
                    span_trace = %failure.source.span_trace(),
                    "ワイプが途中で失敗しました"
                );
                let detail = format!(
                    "{failure}。コミット済みのバッチは削除されたままです。同じリクエストを再実行すると残りを削除できます"
                );
                match failure.source.kind() {
                    InfraErrorKind::IdentityUnavailable => ErrorResponse::service_unavailable(detail),
                    _ => ErrorResponse::wipe_step_failed(detail),
                }
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
