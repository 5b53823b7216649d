//! # BlobWiper
//!
//! スコープのキー接頭辞に一致するファイル実体を 1 件ずつ削除する。
//!
//! 一覧取得の失敗も個別削除の失敗もエラーとして返さず、結果に集計する。
//! ファイル実体が残ってもドキュメント側の削除は完了しており、再実行で消せるため。

use std::sync::Arc;

use thesisflow_domain::scope::BlobPrefix;

use super::BlobWipeResult;
use crate::store::BlobStore;

pub struct BlobWiper {
    store: Arc<dyn BlobStore>,
}

impl BlobWiper {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// 接頭辞配下のオブジェクトをすべて削除する
    #[tracing::instrument(skip_all, fields(prefix = %prefix))]
    pub async fn delete_by_prefix(&self, prefix: &BlobPrefix) -> BlobWipeResult {
        let mut result = BlobWipeResult::default();

        let objects = match self.store.list_by_prefix(prefix.as_str()).await {
            Ok(objects) => objects,
            Err(e) => {
                tracing::warn!(error = %e, "ファイル一覧の取得に失敗");
                result
                    .errors
                    .push(format!("{prefix} 配下のファイル一覧を取得できませんでした: {e}"));
                return result;
            }
        };

        for object in &objects {
            match self.store.delete(object).await {
                Ok(()) => result.deleted_count += 1,
                Err(e) => {
                    tracing::warn!(key = object.key(), error = %e, "ファイル削除に失敗");
                    result.failed += 1;
                    result.errors.push(format!("{}: {e}", object.key()));
                }
            }
        }

        tracing::info!(
            deleted = result.deleted_count,
            failed = result.failed,
            "ファイル実体の削除が完了"
        );
        result
    }
}
