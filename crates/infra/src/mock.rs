//! # テスト用インメモリストア
//!
//! ワイプ処理のテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! thesisflow-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! いずれも呼び出し履歴を記録し、障害を注入できる。

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    error::InfraError,
    store::{
        AccountPage,
        BlobObject,
        BlobStore,
        BulkDeleteFailure,
        BulkDeleteResponse,
        DocumentQuery,
        DocumentRef,
        DocumentStore,
        IdentityProvider,
    },
};

// ===== InMemoryDocumentStore =====

#[derive(Default)]
struct DocumentState {
    paths:                   BTreeSet<String>,
    queries:                 Vec<DocumentQuery>,
    batch_sizes:             Vec<usize>,
    ignore_cursor:           bool,
    fail_queries:            bool,
    /// この回数のバッチ削除が成功した後は失敗させる
    batch_delete_fail_after: Option<usize>,
}

/// パス昇順で検索結果を返すインメモリのドキュメントストア
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<DocumentState>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>) {
        self.state.lock().unwrap().paths.insert(path.into());
    }

    /// 残っているドキュメントのパス（昇順）
    pub fn paths(&self) -> Vec<String> {
        self.state.lock().unwrap().paths.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 実行された検索
    pub fn queries(&self) -> Vec<DocumentQuery> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn query_count(&self) -> usize {
        self.state.lock().unwrap().queries.len()
    }

    /// コミットされたバッチごとの件数
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().unwrap().batch_sizes.clone()
    }

    /// `start_after` を無視して常に先頭から返すようにする
    pub fn ignore_cursor(&self) {
        self.state.lock().unwrap().ignore_cursor = true;
    }

    /// 以降の検索をすべて失敗させる
    pub fn fail_queries(&self) {
        self.state.lock().unwrap().fail_queries = true;
    }

    /// `succeed` 回のバッチ削除が成功した後、以降を失敗させる
    pub fn fail_batch_delete_after(&self, succeed: usize) {
        self.state.lock().unwrap().batch_delete_fail_after = Some(succeed);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<DocumentRef>, InfraError> {
        let mut state = self.state.lock().unwrap();
        state.queries.push(query.clone());

        if state.fail_queries {
            return Err(InfraError::dynamo_db("テスト用の検索失敗"));
        }

        let start_after = if state.ignore_cursor {
            None
        } else {
            query.start_after.as_deref()
        };

        Ok(state
            .paths
            .iter()
            .filter(|path| start_after.is_none_or(|cursor| path.as_str() > cursor))
            .map(|path| DocumentRef::new(path.as_str()))
            .filter(|doc| {
                if query.group {
                    doc.collection_name() == query.collection
                } else {
                    doc.collection_path() == query.collection
                }
            })
            .take(query.limit)
            .collect())
    }

    async fn batch_delete(&self, refs: &[DocumentRef]) -> Result<(), InfraError> {
        let mut state = self.state.lock().unwrap();

        if let Some(remaining) = state.batch_delete_fail_after {
            if remaining == 0 {
                return Err(InfraError::dynamo_db("テスト用のバッチ削除失敗"));
            }
            state.batch_delete_fail_after = Some(remaining - 1);
        }

        for doc in refs {
            state.paths.remove(doc.path());
        }
        state.batch_sizes.push(refs.len());
        Ok(())
    }
}

// ===== InMemoryIdentityProvider =====

#[derive(Default)]
struct IdentityState {
    accounts:          BTreeSet<String>,
    failures:          HashMap<String, String>,
    bulk_delete_sizes: Vec<usize>,
    fail_listing:      bool,
}

/// カーソル付きでアカウントを列挙するインメモリの認証サービス
///
/// カーソルは最後に返したアカウント ID。
#[derive(Clone, Default)]
pub struct InMemoryIdentityProvider {
    state: Arc<Mutex<IdentityState>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, id: impl Into<String>) {
        self.state.lock().unwrap().accounts.insert(id.into());
    }

    /// 残っているアカウント ID（昇順）
    pub fn account_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().accounts.iter().cloned().collect()
    }

    /// 指定アカウントの削除を失敗させる
    pub fn fail_deletion_of(&self, id: impl Into<String>, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(id.into(), message.into());
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().fail_listing = true;
    }

    /// 一括削除の呼び出しごとの件数
    pub fn bulk_delete_sizes(&self) -> Vec<usize> {
        self.state.lock().unwrap().bulk_delete_sizes.clone()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn list_accounts(
        &self,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<AccountPage, InfraError> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(InfraError::identity_unavailable());
        }

        let mut remaining = state
            .accounts
            .iter()
            .filter(|id| cursor.is_none_or(|c| id.as_str() > c));
        let account_ids: Vec<String> = remaining.by_ref().take(page_size).cloned().collect();
        let next_cursor = if remaining.next().is_some() {
            account_ids.last().cloned()
        } else {
            None
        };

        Ok(AccountPage {
            account_ids,
            next_cursor,
        })
    }

    async fn bulk_delete(&self, account_ids: &[String]) -> Result<BulkDeleteResponse, InfraError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.bulk_delete_sizes.push(account_ids.len());

        let mut response = BulkDeleteResponse::default();
        for (index, id) in account_ids.iter().enumerate() {
            match state.failures.get(id) {
                Some(message) => response.failures.push(BulkDeleteFailure {
                    index,
                    message: message.clone(),
                }),
                None => {
                    state.accounts.remove(id);
                    response.success_count += 1;
                }
            }
        }
        Ok(response)
    }
}

// ===== InMemoryBlobStore =====

#[derive(Default)]
struct BlobState {
    keys:         BTreeSet<String>,
    failing_keys: HashSet<String>,
    fail_listing: bool,
}

/// キー接頭辞で列挙できるインメモリのファイルストレージ
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    state: Arc<Mutex<BlobState>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<String>) {
        self.state.lock().unwrap().keys.insert(key.into());
    }

    /// 残っているキー（昇順）
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().unwrap().keys.iter().cloned().collect()
    }

    pub fn fail_deletion_of(&self, key: impl Into<String>) {
        self.state.lock().unwrap().failing_keys.insert(key.into());
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().fail_listing = true;
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<BlobObject>, InfraError> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(InfraError::s3("テスト用の一覧取得失敗"));
        }
        Ok(state
            .keys
            .iter()
            .filter(|key| key.starts_with(prefix))
            .map(BlobObject::new)
            .collect())
    }

    async fn delete(&self, object: &BlobObject) -> Result<(), InfraError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_keys.contains(object.key()) {
            return Err(InfraError::s3(format!("テスト用の削除失敗: {}", object.key())));
        }
        state.keys.remove(object.key());
        Ok(())
    }
}
