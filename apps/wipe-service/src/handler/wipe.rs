//! # ワイプ API ハンドラ
//!
//! ```text
//! POST /internal/wipe?category=thesis&department=cs
//! Content-Type: application/json
//!
//! {"category": "thesis", "year": "2024-2025", "department": "cs", "course": "bscs"}
//! ```
//!
//! パラメータはボディとクエリ文字列のどちらでも受け付け、項目ごとにボディを優先する。
//! ボディは省略できる。

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use thesisflow_domain::{Category, scope::ScopeInput};
use thesisflow_infra::wipe::{
    BlobWipeResult,
    IdentityWipeResult,
    StepReport,
    WipeOutcome,
};
use thesisflow_shared::ApiResponse;

use crate::{
    error::WipeServiceError,
    usecase::{WipeRequest, WipeUseCaseImpl},
};

/// ワイプハンドラーの State
pub struct WipeState {
    pub usecase: WipeUseCaseImpl,
}

/// ワイプパラメータ（ボディ・クエリ共通）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WipeParams {
    pub category:   Option<String>,
    pub year:       Option<String>,
    pub department: Option<String>,
    pub course:     Option<String>,
}

impl WipeParams {
    /// ボディを優先してクエリとマージする
    fn merge(mut body: WipeParams, mut query: WipeParams) -> WipeRequest {
        let category =
            non_blank(body.category.take()).or_else(|| non_blank(query.category.take()));
        WipeRequest {
            category,
            scope: ScopeInput::merge(body.into_scope(), query.into_scope()),
        }
    }

    fn into_scope(self) -> ScopeInput {
        ScopeInput {
            year:       self.year,
            department: self.department,
            course:     self.course,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// ボディの JSON をパースする（空ボディはパラメータなし）
fn parse_body(body: &Bytes) -> Result<WipeParams, WipeServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(WipeParams::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| WipeServiceError::BadRequest(format!("JSON ボディを解析できません: {e}")))
}

/// コレクション 1 つ分の削除結果 DTO
#[derive(Debug, Serialize)]
pub struct StepReportDto {
    pub collection:        String,
    pub scoped:            bool,
    pub deleted_count:     u64,
    pub batches_committed: u64,
}

impl From<&StepReport> for StepReportDto {
    fn from(step: &StepReport) -> Self {
        Self {
            collection:        step.collection.to_string(),
            scoped:            step.scoped,
            deleted_count:     step.result.deleted_count,
            batches_committed: step.result.batches_committed,
        }
    }
}

/// 認証アカウント削除で失敗した 1 件の DTO
#[derive(Debug, Serialize)]
pub struct IdentityFailureDto {
    pub id:      String,
    pub message: String,
}

/// 認証アカウント削除結果 DTO
#[derive(Debug, Serialize)]
pub struct IdentityWipeDto {
    pub succeeded: u64,
    pub failed:    u64,
    pub errors:    Vec<IdentityFailureDto>,
}

impl From<&IdentityWipeResult> for IdentityWipeDto {
    fn from(result: &IdentityWipeResult) -> Self {
        Self {
            succeeded: result.succeeded,
            failed:    result.failed,
            errors:    result
                .errors
                .iter()
                .map(|e| IdentityFailureDto {
                    id:      e.id.clone(),
                    message: e.message.clone(),
                })
                .collect(),
        }
    }
}

/// ファイル実体削除結果 DTO
#[derive(Debug, Serialize)]
pub struct BlobWipeDto {
    pub deleted_count: u64,
    pub failed:        u64,
    pub errors:        Vec<String>,
}

impl From<&BlobWipeResult> for BlobWipeDto {
    fn from(result: &BlobWipeResult) -> Self {
        Self {
            deleted_count: result.deleted_count,
            failed:        result.failed,
            errors:        result.errors.clone(),
        }
    }
}

/// ワイプ結果 DTO
#[derive(Debug, Serialize)]
pub struct WipeOutcomeDto {
    pub category:          Category,
    pub scope:             String,
    pub year:              String,
    pub deleted_count:     u64,
    pub batches_committed: u64,
    pub steps:             Vec<StepReportDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity:          Option<IdentityWipeDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blobs:             Option<BlobWipeDto>,
    pub message:           String,
}

impl From<WipeOutcome> for WipeOutcomeDto {
    fn from(outcome: WipeOutcome) -> Self {
        Self {
            category:          outcome.category,
            scope:             outcome.scope_description,
            year:              outcome.year,
            deleted_count:     outcome.documents.deleted_count,
            batches_committed: outcome.documents.batches_committed,
            steps:             outcome.steps.iter().map(StepReportDto::from).collect(),
            identity:          outcome.identity.as_ref().map(IdentityWipeDto::from),
            blobs:             outcome.blobs.as_ref().map(BlobWipeDto::from),
            message:           outcome.message,
        }
    }
}

/// POST /internal/wipe
///
/// カテゴリとスコープに一致するデータを削除する。
///
/// ## レスポンス
///
/// - `200 OK`: 削除結果
/// - `400 Bad Request`: JSON・クエリ文字列の不正、カテゴリ不明、`course` のみ指定
/// - `500 Internal Server Error`: 削除ステップの途中失敗（再実行で残りを削除できる）
#[tracing::instrument(skip_all)]
pub async fn wipe(
    State(state): State<Arc<WipeState>>,
    query: Result<Query<WipeParams>, QueryRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, WipeServiceError> {
    let Query(query) = query.map_err(|e| {
        WipeServiceError::BadRequest(format!("クエリ文字列を解析できません: {}", e.body_text()))
    })?;
    let body = parse_body(&body)?;
    let request = WipeParams::merge(body, query);

    let outcome = state.usecase.execute_wipe(request).await?;

    let response = ApiResponse::new(WipeOutcomeDto::from(outcome));
    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn params(category: Option<&str>, department: Option<&str>) -> WipeParams {
        WipeParams {
            category: category.map(String::from),
            department: department.map(String::from),
            ..WipeParams::default()
        }
    }

    #[test]
    fn test_ボディの値がクエリより優先される() {
        let request = WipeParams::merge(
            params(Some("thesis"), Some("cs")),
            params(Some("user"), Some("math")),
        );

        assert_eq!(request.category.as_deref(), Some("thesis"));
        assert_eq!(request.scope.department.as_deref(), Some("cs"));
    }

    #[test]
    fn test_ボディの空文字はクエリの値に負ける() {
        let request = WipeParams::merge(
            params(Some(" "), Some("")),
            params(Some("audit"), Some("math")),
        );

        assert_eq!(request.category.as_deref(), Some("audit"));
        assert_eq!(request.scope.department.as_deref(), Some("math"));
    }

    #[test]
    fn test_空ボディはパラメータなしとして扱う() {
        let parsed = parse_body(&Bytes::from_static(b" \n")).unwrap();

        assert!(parsed.category.is_none());
    }

    #[test]
    fn test_不正なjsonはbad_request() {
        let result = parse_body(&Bytes::from_static(b"{category"));

        assert!(matches!(result, Err(WipeServiceError::BadRequest(_))));
    }
}
