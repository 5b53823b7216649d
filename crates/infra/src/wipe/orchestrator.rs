//! # WipeOrchestrator
//!
//! カテゴリの削除計画を逐次実行し、結果を集約する。
//!
//! ## 実行規則
//!
//! - ステップは計画の順（子コレクション → 親コレクション → 認証 → ファイル実体）
//! - ドキュメントストアのステップが失敗したら、残りのステップは実行せずに失敗を返す
//! - 認証アカウント・ファイル実体の個別失敗は結果に集計し、ワイプは成功扱い
//!
//! ロールバックはしない。失敗時は同じワイプを再実行すれば残りが削除される。

use std::sync::Arc;

use itertools::Itertools;
use thesisflow_domain::{
    Category,
    plan::{CategoryPlan, PlanStep},
    scope::Scope,
};
use thiserror::Error;

use super::{
    BatchDeleter,
    BlobWipeResult,
    BlobWiper,
    GroupDeleter,
    IdentityWipeResult,
    IdentityWiper,
    ScopedGroupDeleter,
    WipeResult,
};
use crate::{
    error::InfraError,
    store::{BlobStore, DocumentStore, IdentityProvider},
};

/// ワイプの実行パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WipeConfig {
    /// ドキュメントストアの 1 バッチの件数
    pub batch_size:           usize,
    /// 認証アカウント一覧の 1 ページの件数
    pub identity_page_size:   usize,
    /// グループ削除 1 回あたりの取得回数の上限
    pub max_group_iterations: u32,
}

impl Default for WipeConfig {
    fn default() -> Self {
        Self {
            batch_size:           500,
            identity_page_size:   1000,
            max_group_iterations: 10_000,
        }
    }
}

/// コレクション 1 つ分の実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub collection: &'static str,
    /// スコープで絞り込んだか（トップレベルコレクションは `false`）
    pub scoped:     bool,
    pub result:     WipeResult,
}

/// ワイプの実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeOutcome {
    pub category:          Category,
    pub scope_description: String,
    pub year:              String,
    /// 全コレクションの合計
    pub documents:         WipeResult,
    pub steps:             Vec<StepReport>,
    pub identity:          Option<IdentityWipeResult>,
    pub blobs:             Option<BlobWipeResult>,
    pub message:           String,
}

/// ドキュメントストアのステップ失敗
///
/// 先行ステップの削除は確定済み。どこまで進んだかは利用者に返さずログにだけ残す。
#[derive(Debug, Error)]
#[error("{step} の削除に失敗しました: {source}")]
pub struct WipeStepFailure {
    /// 失敗したステップ名（コレクション名など）
    pub step:            String,
    /// 失敗までに完了したステップ数
    pub completed_steps: usize,
    #[source]
    pub source:          InfraError,
}

pub struct WipeOrchestrator {
    batch_deleter: BatchDeleter,
    group_deleter: Arc<dyn ScopedGroupDeleter>,
    identity:      IdentityWiper,
    blobs:         BlobWiper,
    config:        WipeConfig,
}

impl WipeOrchestrator {
    /// クライアント側フィルタの [`GroupDeleter`] を使うオーケストレーターを生成する
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        blobs: Arc<dyn BlobStore>,
        config: WipeConfig,
    ) -> Self {
        let group_deleter = Arc::new(GroupDeleter::new(
            documents.clone(),
            config.max_group_iterations,
        ));
        Self {
            batch_deleter: BatchDeleter::new(documents),
            group_deleter,
            identity: IdentityWiper::new(identity),
            blobs: BlobWiper::new(blobs),
            config,
        }
    }

    /// グループ削除の実装を差し替える
    pub fn with_group_deleter(mut self, group_deleter: Arc<dyn ScopedGroupDeleter>) -> Self {
        self.group_deleter = group_deleter;
        self
    }

    pub fn config(&self) -> &WipeConfig {
        &self.config
    }

    /// カテゴリの削除計画をスコープ内で実行する
    ///
    /// # Errors
    ///
    /// ドキュメントストアのステップ、または認証サービスの呼び出しが失敗した場合。
    #[tracing::instrument(
        skip_all,
        fields(category = %category, scope = %scope.description(), year = scope.year())
    )]
    pub async fn execute(
        &self,
        category: Category,
        scope: &Scope,
    ) -> Result<WipeOutcome, WipeStepFailure> {
        let plan = CategoryPlan::for_category(category);
        let prefix = scope.path_prefix();

        let mut documents = WipeResult::default();
        let mut steps = Vec::new();
        let mut identity = None;
        let mut blobs = None;

        for (index, step) in plan.steps().into_iter().enumerate() {
            let fail = |step: &str, source: InfraError| {
                tracing::error!(
                    step,
                    completed_steps = index,
                    error = %source,
                    "ワイプのステップが失敗したため中断"
                );
                WipeStepFailure {
                    step: step.to_string(),
                    completed_steps: index,
                    source,
                }
            };

            match step {
                PlanStep::Collection(target) => {
                    let deleted = if target.is_group_query() {
                        self.group_deleter
                            .delete_matching(target.name(), Some(&prefix), self.config.batch_size)
                            .await
                    } else {
                        self.batch_deleter
                            .delete_all(target.name(), self.config.batch_size)
                            .await
                    };
                    let result = deleted.map_err(|e| fail(target.name(), e))?;

                    tracing::info!(
                        collection = target.name(),
                        deleted = result.deleted_count,
                        "コレクションの削除が完了"
                    );
                    documents += result;
                    steps.push(StepReport {
                        collection: target.name(),
                        scoped: target.is_group_query(),
                        result,
                    });
                }
                PlanStep::IdentityAccounts => {
                    let result = self
                        .identity
                        .delete_all_accounts(self.config.identity_page_size)
                        .await
                        .map_err(|e| fail("identity", e))?;
                    identity = Some(result);
                }
                PlanStep::BlobObjects => {
                    blobs = Some(self.blobs.delete_by_prefix(&scope.blob_prefix()).await);
                }
            }
        }

        let message = build_message(&plan, scope, documents, identity.as_ref(), blobs.as_ref());
        tracing::info!(deleted = documents.deleted_count, "ワイプが完了");

        Ok(WipeOutcome {
            category,
            scope_description: scope.description(),
            year: scope.year().to_string(),
            documents,
            steps,
            identity,
            blobs,
            message,
        })
    }
}

fn build_message(
    plan: &CategoryPlan,
    scope: &Scope,
    documents: WipeResult,
    identity: Option<&IdentityWipeResult>,
    blobs: Option<&BlobWipeResult>,
) -> String {
    let mut parts = vec![format!(
        "{} のワイプが完了しました（学年度: {}、スコープ: {}）。ドキュメント {} 件を削除しました",
        plan.category(),
        scope.year(),
        scope.description(),
        documents.deleted_count
    )];

    if let Some(identity) = identity {
        parts.push(format!(
            "認証アカウントはスコープに関係なく全件が対象です（成功 {} 件、失敗 {} 件）",
            identity.succeeded, identity.failed
        ));
    }
    if let Some(blobs) = blobs {
        parts.push(format!(
            "ファイル {} 件を削除しました（失敗 {} 件）",
            blobs.deleted_count, blobs.failed
        ));
    }
    if plan.has_top_level_collections() && scope.is_narrowed() {
        let names = plan
            .collections()
            .iter()
            .filter(|c| !c.is_group_query())
            .map(|c| c.name())
            .join(", ");
        parts.push(format!(
            "{names} はスコープで絞り込めないため全件を削除しました"
        ));
    }

    parts.join("。")
}
