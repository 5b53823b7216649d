//! # カテゴリ別削除計画
//!
//! カテゴリごとに、どのコレクションをどの順で削除し、認証アカウント・
//! ファイル実体にも触れるかを静的に定義する。
//!
//! ## 削除順序
//!
//! 子コレクション → 親コレクションの順に並べる。途中で失敗しても親だけが
//! 消えて子が孤立することはなく、再実行で残りを消せる。
//!
//! ```text
//! group:  audits → expertRequests → panelComments → proposals → join
//!         → configuration → calendar → (thesis 計画) → groups
//! thesis: chats → submissions → chapters → terminal → stages → thesis
//! ```
//!
//! 計画は `const` テーブルから組み立てる不変値で、実行時に書き換えられる
//! グローバル状態は持たない。

use crate::Category;

/// 削除対象のコレクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionTarget {
    name:           &'static str,
    is_group_query: bool,
}

impl CollectionTarget {
    /// 親パスを問わず同名のコレクションすべて（スコープで絞り込む）
    pub const fn group(name: &'static str) -> Self {
        Self {
            name,
            is_group_query: true,
        }
    }

    /// 直接指定するトップレベルコレクション（スコープ対象外）
    pub const fn top_level(name: &'static str) -> Self {
        Self {
            name,
            is_group_query: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_group_query(&self) -> bool {
        self.is_group_query
    }
}

const THESIS_COLLECTIONS: [CollectionTarget; 6] = [
    CollectionTarget::group("chats"),
    CollectionTarget::group("submissions"),
    CollectionTarget::group("chapters"),
    CollectionTarget::group("terminal"),
    CollectionTarget::group("stages"),
    CollectionTarget::group("thesis"),
];

/// group 配下で thesis より先に消すコレクション
const GROUP_CHILD_COLLECTIONS: [CollectionTarget; 7] = [
    CollectionTarget::group("audits"),
    CollectionTarget::group("expertRequests"),
    CollectionTarget::group("panelComments"),
    CollectionTarget::group("proposals"),
    CollectionTarget::group("join"),
    CollectionTarget::group("configuration"),
    CollectionTarget::group("calendar"),
];

const GROUP_ROOT: CollectionTarget = CollectionTarget::group("groups");

const CALENDAR_COLLECTIONS: [CollectionTarget; 2] = [
    CollectionTarget::group("events"),
    CollectionTarget::group("calendar"),
];

const EVENT_COLLECTIONS: [CollectionTarget; 1] = [CollectionTarget::group("events")];

const USER_COLLECTIONS: [CollectionTarget; 1] = [CollectionTarget::group("users")];

const FILE_COLLECTIONS: [CollectionTarget; 1] = [CollectionTarget::group("files")];

const AUDIT_COLLECTIONS: [CollectionTarget; 2] = [
    CollectionTarget::group("audits"),
    CollectionTarget::top_level("systemAudits"),
];

/// 計画の 1 ステップ
///
/// オーケストレーターはこの順に逐次実行する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStep {
    /// ドキュメントストアのコレクション削除
    Collection(CollectionTarget),
    /// 認証サービスの全アカウント削除（常にグローバル）
    IdentityAccounts,
    /// ファイルストレージのスコープ配下オブジェクト削除
    BlobObjects,
}

/// カテゴリ別の削除計画
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPlan {
    category:           Category,
    collections:        Vec<CollectionTarget>,
    touches_identity:   bool,
    touches_blob_store: bool,
}

impl CategoryPlan {
    /// カテゴリに対応する計画を返す
    pub fn for_category(category: Category) -> Self {
        let (collections, touches_identity, touches_blob_store) = match category {
            Category::Thesis => (THESIS_COLLECTIONS.to_vec(), false, false),
            Category::Group => {
                let mut collections = GROUP_CHILD_COLLECTIONS.to_vec();
                collections.extend(THESIS_COLLECTIONS);
                collections.push(GROUP_ROOT);
                (collections, false, false)
            }
            Category::Calendar => (CALENDAR_COLLECTIONS.to_vec(), false, false),
            Category::Event => (EVENT_COLLECTIONS.to_vec(), false, false),
            Category::User => (USER_COLLECTIONS.to_vec(), true, false),
            Category::File => (FILE_COLLECTIONS.to_vec(), false, true),
            Category::Audit => (AUDIT_COLLECTIONS.to_vec(), false, false),
        };

        Self {
            category,
            collections,
            touches_identity,
            touches_blob_store,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn collections(&self) -> &[CollectionTarget] {
        &self.collections
    }

    pub fn touches_identity(&self) -> bool {
        self.touches_identity
    }

    pub fn touches_blob_store(&self) -> bool {
        self.touches_blob_store
    }

    /// スコープで絞り込めないトップレベルコレクションを含むか
    pub fn has_top_level_collections(&self) -> bool {
        self.collections.iter().any(|c| !c.is_group_query())
    }

    /// 実行順のステップ列
    ///
    /// コレクション（子 → 親）→ 認証アカウント → ファイル実体 の順。
    pub fn steps(&self) -> Vec<PlanStep> {
        let mut steps: Vec<PlanStep> = self
            .collections
            .iter()
            .copied()
            .map(PlanStep::Collection)
            .collect();
        if self.touches_identity {
            steps.push(PlanStep::IdentityAccounts);
        }
        if self.touches_blob_store {
            steps.push(PlanStep::BlobObjects);
        }
        steps
    }

    /// コレクション名の一覧（実行順）
    pub fn collection_names(&self) -> Vec<&'static str> {
        self.collections.iter().map(|c| c.name()).collect()
    }
}
