//! # GroupDeleter
//!
//! 同名のコレクションを親パスを問わず横断し、スコープのパス接頭辞に含まれる
//! ドキュメントだけを削除する。
//!
//! ## クライアント側フィルタ
//!
//! ドキュメントストアのグループ検索は祖先パスで絞り込めないため、ページを取得して
//! からパス接頭辞で振り分ける。スコープ外のドキュメントはページに残り続けるので、
//! 取得の継続はパス昇順のカーソル（`start_after`）で前に進める。
//!
//! 終了条件:
//!
//! - 取得したページが空
//! - スコープ内のドキュメントがなく、かつページが `batch_size` 未満（末尾に到達）
//!
//! カーソルを尊重しないストアでは同じページが返り続けるため、取得回数の上限を
//! 超えたら [`InfraError::iteration_limit_exceeded`] で止める。

use std::sync::Arc;

use async_trait::async_trait;
use thesisflow_domain::scope::PathPrefix;

use super::{
    WipeResult,
    batch::{assert_batch_size, commit_batch},
};
use crate::{
    error::InfraError,
    store::{DocumentQuery, DocumentRef, DocumentStore},
};

/// スコープ付きのグループ削除
///
/// オーケストレーターはこのトレイト越しに呼び出す。ストアが祖先パスでの検索を
/// サポートする場合はサーバー側で絞り込む実装に差し替えられる。
#[async_trait]
pub trait ScopedGroupDeleter: Send + Sync {
    /// `collection_name` という名前のコレクションから、`prefix` 配下のドキュメントを削除する
    ///
    /// `prefix` が `None` ならすべて削除する。
    async fn delete_matching(
        &self,
        collection_name: &str,
        prefix: Option<&PathPrefix>,
        batch_size: usize,
    ) -> Result<WipeResult, InfraError>;
}

/// クライアント側でパス接頭辞を判定する [`ScopedGroupDeleter`]
pub struct GroupDeleter {
    store:          Arc<dyn DocumentStore>,
    max_iterations: u32,
}

impl GroupDeleter {
    pub fn new(store: Arc<dyn DocumentStore>, max_iterations: u32) -> Self {
        Self {
            store,
            max_iterations,
        }
    }
}

#[async_trait]
impl ScopedGroupDeleter for GroupDeleter {
    #[tracing::instrument(skip(self, prefix), fields(prefix = prefix.map(PathPrefix::as_str)), err)]
    async fn delete_matching(
        &self,
        collection_name: &str,
        prefix: Option<&PathPrefix>,
        batch_size: usize,
    ) -> Result<WipeResult, InfraError> {
        assert_batch_size(batch_size);

        let mut result = WipeResult::default();
        let mut cursor: Option<String> = None;
        let mut iterations = 0_u32;

        loop {
            if iterations >= self.max_iterations {
                tracing::error!(
                    collection = collection_name,
                    iterations,
                    cursor = cursor.as_deref(),
                    "取得回数の上限に達したため中断"
                );
                return Err(InfraError::iteration_limit_exceeded(
                    collection_name,
                    iterations,
                ));
            }
            iterations += 1;

            let query = DocumentQuery::group(collection_name, batch_size).start_after(cursor.clone());
            let page = self.store.query(&query).await?;
            let Some(last) = page.last() else {
                break;
            };
            let next_cursor = last.path().to_string();
            let fetched = page.len();

            let matched: Vec<DocumentRef> = match prefix {
                Some(prefix) => page
                    .into_iter()
                    .filter(|doc| prefix.contains(doc.path()))
                    .collect(),
                None => page,
            };

            if matched.is_empty() {
                if fetched < batch_size {
                    break;
                }
                tracing::debug!(fetched, "スコープ内のドキュメントがないページをスキップ");
            } else {
                commit_batch(self.store.as_ref(), &matched, &mut result).await?;
            }

            cursor = Some(next_cursor);
        }

        Ok(result)
    }
}
