//! # BatchDeleter
//!
//! 1 つのコレクションパスのドキュメントを、上限付きのバッチで繰り返し削除する。
//!
//! ## 削除方式
//!
//! 最大 `batch_size` 件を取得 → 空なら終了 → そのページ全体を 1 回のバッチ削除で
//! コミット、を繰り返す。バッチごとに独立してコミットされるため、途中で落ちても
//! 再実行すれば続きから削除できる（削除済みのドキュメントは次のページに現れない）。

use std::sync::Arc;

use super::WipeResult;
use crate::{
    error::InfraError,
    store::{DocumentQuery, DocumentRef, DocumentStore, MAX_BATCH_WRITE},
};

/// バッチサイズがストアの上限内かを検証する
///
/// 上限超過は呼び出し側のプログラミングエラーとして扱う。
pub(crate) fn assert_batch_size(batch_size: usize) {
    assert!(
        (1..=MAX_BATCH_WRITE).contains(&batch_size),
        "batch_size は 1..={MAX_BATCH_WRITE} の範囲で指定してください: {batch_size}"
    );
}

/// 1 ページ分をバッチ削除し、結果に加算する
///
/// [`BatchDeleter`] と [`GroupDeleter`](super::GroupDeleter) が共有するコミット単位。
pub(crate) async fn commit_batch(
    store: &dyn DocumentStore,
    refs: &[DocumentRef],
    result: &mut WipeResult,
) -> Result<(), InfraError> {
    store.batch_delete(refs).await?;

    result.deleted_count += refs.len() as u64;
    result.batches_committed += 1;

    tracing::debug!(
        deleted = refs.len(),
        batches_committed = result.batches_committed,
        "バッチ削除をコミット"
    );
    Ok(())
}

/// コレクションパス単位の Deleter
pub struct BatchDeleter {
    store: Arc<dyn DocumentStore>,
}

impl BatchDeleter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// コレクションのドキュメントをすべて削除する
    ///
    /// # Panics
    ///
    /// `batch_size` が 0 または [`MAX_BATCH_WRITE`] を超える場合。
    #[tracing::instrument(skip(self), err)]
    pub async fn delete_all(
        &self,
        collection_path: &str,
        batch_size: usize,
    ) -> Result<WipeResult, InfraError> {
        assert_batch_size(batch_size);

        let mut result = WipeResult::default();
        let query = DocumentQuery::collection(collection_path, batch_size);

        loop {
            let page = self.store.query(&query).await?;
            if page.is_empty() {
                break;
            }
            commit_batch(self.store.as_ref(), &page, &mut result).await?;
        }

        Ok(result)
    }
}
