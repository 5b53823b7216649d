//! # ストアクライアントのインターフェース
//!
//! ワイプ処理が依存する 3 つの外部ストアを抽象化する。
//!
//! - [`DocumentStore`]: 階層パスを持つドキュメントデータベース
//! - [`IdentityProvider`]: 認証アカウントを管理する認証サービス
//! - [`BlobStore`]: キー接頭辞で列挙できるファイルストレージ
//!
//! 本番実装は [`crate::dynamodb`], [`crate::identity`], [`crate::s3`]、
//! テスト用のインメモリ実装は `test-utils` feature の [`crate::mock`] にある。
//! 一時的な障害のリトライは各実装の責務で、ワイプ処理側ではリトライしない。

use async_trait::async_trait;

use crate::error::InfraError;

/// ドキュメントストアの 1 回のバッチ削除で扱える最大件数
pub const MAX_BATCH_WRITE: usize = 500;

/// 認証サービスの 1 回の一括削除で扱える最大件数
pub const MAX_IDENTITY_BATCH: usize = 1000;

// ===== ドキュメントストア =====

/// ドキュメントへの参照
///
/// `path` はルートからのフルパス（`year/2024-2025/.../thesis/t1`）。
/// 最後のセグメントがドキュメント ID、その 1 つ前がコレクション名になる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    path: String,
}

impl DocumentRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// ドキュメント ID（パスの最後のセグメント）
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// 所属するコレクションのパス（ID を除いた部分）
    pub fn collection_path(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    /// 所属するコレクション名
    pub fn collection_name(&self) -> &str {
        let parent = self.collection_path();
        parent.rsplit('/').next().unwrap_or_default()
    }
}

/// ドキュメントの検索条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    /// コレクションパス（直接指定）またはコレクション名（グループ検索）
    pub collection:  String,
    /// `true` なら親パスを問わず同名のコレクションすべてを対象にする
    pub group:       bool,
    /// 取得上限
    pub limit:       usize,
    /// このパスより後ろから取得する（パス昇順のカーソル）
    pub start_after: Option<String>,
}

impl DocumentQuery {
    /// コレクションパスを直接指定する検索
    pub fn collection(path: impl Into<String>, limit: usize) -> Self {
        Self {
            collection: path.into(),
            group: false,
            limit,
            start_after: None,
        }
    }

    /// 同名コレクションを横断するグループ検索
    pub fn group(name: impl Into<String>, limit: usize) -> Self {
        Self {
            collection: name.into(),
            group: true,
            limit,
            start_after: None,
        }
    }

    pub fn start_after(mut self, path: Option<String>) -> Self {
        self.start_after = path;
        self
    }
}

/// ドキュメントストアクライアント
///
/// 検索結果はパス昇順で返し、`start_after` を尊重すること。
/// グループ検索に祖先パスでの絞り込みはない（呼び出し側で行う）。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 条件に合うドキュメントを最大 `limit` 件返す
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<DocumentRef>, InfraError>;

    /// 指定ドキュメントをまとめて削除する
    ///
    /// `refs.len()` は [`MAX_BATCH_WRITE`] 以下。存在しないドキュメントの削除は無視される。
    /// 実装がストアの制約で分割して書き込む場合、エラー時には一部だけ削除済みのことがある。
    /// 呼び出し側はエラーになったページを件数に数えない（再実行で残りが消える）。
    async fn batch_delete(&self, refs: &[DocumentRef]) -> Result<(), InfraError>;
}

// ===== 認証サービス =====

/// アカウント一覧の 1 ページ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPage {
    pub account_ids: Vec<String>,
    /// 次ページのカーソル（`None` または空文字で終端）
    pub next_cursor: Option<String>,
}

/// 一括削除で失敗した 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteFailure {
    /// 要求した ID 配列内の位置
    pub index:   usize,
    pub message: String,
}

/// 一括削除の応答
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteResponse {
    pub success_count: u64,
    pub failures:      Vec<BulkDeleteFailure>,
}

/// 認証サービスクライアント
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// アカウント ID を最大 `page_size` 件返す
    async fn list_accounts(
        &self,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<AccountPage, InfraError>;

    /// アカウントを一括削除する
    ///
    /// 個別の失敗は応答の `failures` に入り、呼び出し自体はエラーにならない。
    async fn bulk_delete(&self, account_ids: &[String]) -> Result<BulkDeleteResponse, InfraError>;
}

// ===== ファイルストレージ =====

/// ファイルストレージ上のオブジェクト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    key: String,
}

impl BlobObject {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// ファイルストレージクライアント
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// キー接頭辞に一致するオブジェクトをすべて返す
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<BlobObject>, InfraError>;

    /// オブジェクトを 1 件削除する
    async fn delete(&self, object: &BlobObject) -> Result<(), InfraError>;
}
