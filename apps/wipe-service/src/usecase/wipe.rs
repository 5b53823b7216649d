//! # ワイプユースケース
//!
//! カテゴリとスコープを検証してから削除計画を実行する。
//! 検証エラーはストアへのアクセス前に返すため、不正なリクエストで何かが消えることはない。

use thesisflow_domain::{
    Category,
    scope::{ScopeInput, ScopeResolver},
};
use thesisflow_infra::wipe::{WipeOrchestrator, WipeOutcome};

use crate::error::WipeServiceError;

/// ワイプリクエスト（ボディとクエリをマージ済み）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WipeRequest {
    pub category: Option<String>,
    pub scope:    ScopeInput,
}

/// ワイプユースケース実装
pub struct WipeUseCaseImpl {
    resolver:     ScopeResolver,
    orchestrator: WipeOrchestrator,
}

impl WipeUseCaseImpl {
    pub fn new(resolver: ScopeResolver, orchestrator: WipeOrchestrator) -> Self {
        Self {
            resolver,
            orchestrator,
        }
    }

    /// ワイプを実行する
    ///
    /// # Errors
    ///
    /// - `WipeServiceError::Validation`: カテゴリ不明、`course` のみ指定など
    /// - `WipeServiceError::StepFailed`: 削除ステップの途中失敗
    pub async fn execute_wipe(&self, request: WipeRequest) -> Result<WipeOutcome, WipeServiceError> {
        let category = Category::parse(request.category.as_deref())?;
        let scope = self.resolver.resolve(request.scope)?;

        tracing::info!(
            category = %category,
            scope = %scope.description(),
            year = %scope.year(),
            "ワイプを開始します"
        );

        Ok(self.orchestrator.execute(category, &scope).await?)
    }
}
