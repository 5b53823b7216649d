//! # スコープ付き一括削除（ワイプ）
//!
//! カテゴリ単位でドキュメントストア・認証サービス・ファイルストレージのデータを
//! 削除する。
//!
//! ## 構成
//!
//! ```text
//! WipeOrchestrator
//!   ├─ GroupDeleter   … 同名コレクション横断 + パス接頭辞フィルタ
//!   │    └─ バッチコミット（BatchDeleter と共通）
//!   ├─ BatchDeleter   … トップレベルコレクション
//!   ├─ IdentityWiper  … 認証アカウント（常にグローバル）
//!   └─ BlobWiper      … ファイル実体（キー接頭辞）
//! ```
//!
//! ## 再実行による回復
//!
//! ストアをまたぐトランザクションはない。各プリミティブは冪等で状態を持たないため、
//! 途中で失敗したら同じワイプを再実行すれば残りが削除される。

mod batch;
mod blob;
mod group;
mod identity;
mod orchestrator;

use std::ops::AddAssign;

pub use batch::BatchDeleter;
pub use blob::BlobWiper;
pub use group::{GroupDeleter, ScopedGroupDeleter};
pub use identity::IdentityWiper;
pub use orchestrator::{StepReport, WipeConfig, WipeOrchestrator, WipeOutcome, WipeStepFailure};

/// ドキュメントストアの削除結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WipeResult {
    /// 削除したドキュメント数
    pub deleted_count:     u64,
    /// コミットしたバッチ数
    pub batches_committed: u64,
}

impl AddAssign for WipeResult {
    fn add_assign(&mut self, other: Self) {
        self.deleted_count += other.deleted_count;
        self.batches_committed += other.batches_committed;
    }
}

/// 認証アカウント削除で失敗した 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityFailure {
    pub id:      String,
    pub message: String,
}

/// 認証アカウントの削除結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityWipeResult {
    pub succeeded: u64,
    pub failed:    u64,
    pub errors:    Vec<IdentityFailure>,
}

/// ファイル実体の削除結果
///
/// 一覧取得自体の失敗は `errors` に 1 件だけ入り、`failed` には数えない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobWipeResult {
    pub deleted_count: u64,
    pub failed:        u64,
    pub errors:        Vec<String>,
}
