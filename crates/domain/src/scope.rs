//! # スコープ
//!
//! ワイプ対象を絞り込む階層フィルタ（学年度 / 学科 / コース）。
//!
//! ## パスの形式
//!
//! ドキュメントストアの階層パスは次の形をとる:
//!
//! ```text
//! year/{year}/departments/{department}/courses/{course}/groups/{group}/thesis/{thesis}
//! ```
//!
//! [`PathPrefix`] はこのうちスコープで決まる先頭部分、
//! [`BlobPrefix`] は同じ規則で作るファイルストレージのキー接頭辞（`year/` を付けない）。
//!
//! 学科・コースのセグメントはスラッグ化する（小文字化、英数字以外の連続を `-` に置換、
//! 前後の `-` を除去）。スラッグが空になる場合は `general` / `common` を使う。

use std::sync::Arc;

use derive_more::Display;

use crate::{
    DomainError,
    clock::{AcademicYear, Clock},
};

/// 学科セグメントのフォールバック
pub const DEPARTMENT_FALLBACK: &str = "general";
/// コースセグメントのフォールバック
pub const COURSE_FALLBACK: &str = "common";

/// スコープ解決の入力
///
/// リクエストボディ・クエリ文字列から取り出した生の値。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeInput {
    pub year:       Option<String>,
    pub department: Option<String>,
    pub course:     Option<String>,
}

impl ScopeInput {
    /// ボディとクエリを項目ごとにマージする（ボディ優先）
    ///
    /// 空白のみの値は未指定として扱うため、ボディの空文字はクエリの値に負ける。
    pub fn merge(body: ScopeInput, query: ScopeInput) -> Self {
        Self {
            year:       normalize(body.year).or_else(|| normalize(query.year)),
            department: normalize(body.department).or_else(|| normalize(query.department)),
            course:     normalize(body.course).or_else(|| normalize(query.course)),
        }
    }
}

/// 前後の空白を除去し、空なら `None` にする
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 解決済みスコープ
///
/// `course` があれば必ず `department` もある。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    year:       String,
    department: Option<String>,
    course:     Option<String>,
}

impl Scope {
    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn course(&self) -> Option<&str> {
        self.course.as_deref()
    }

    /// ドキュメントストア用のパスプレフィックス
    pub fn path_prefix(&self) -> PathPrefix {
        let mut prefix = format!("year/{}", self.year);
        if let Some(department) = &self.department {
            prefix.push_str("/departments/");
            prefix.push_str(&department_segment(Some(department)));
            if let Some(course) = &self.course {
                prefix.push_str("/courses/");
                prefix.push_str(&course_segment(Some(course)));
            }
        }
        PathPrefix(prefix)
    }

    /// ファイルストレージ用のキー接頭辞
    pub fn blob_prefix(&self) -> BlobPrefix {
        let mut prefix = format!("{}/", self.year);
        if let Some(department) = &self.department {
            prefix.push_str(&department_segment(Some(department)));
            prefix.push('/');
            if let Some(course) = &self.course {
                prefix.push_str(&course_segment(Some(course)));
                prefix.push('/');
            }
        }
        BlobPrefix(prefix)
    }

    /// 人が読むためのスコープ表記（`"dept/course"` / `"dept"` / `"all"`）
    pub fn description(&self) -> String {
        match (&self.department, &self.course) {
            (Some(department), Some(course)) => format!("{department}/{course}"),
            (Some(department), None) => department.clone(),
            _ => "all".to_string(),
        }
    }

    /// 学科・コースで絞り込まれているか
    pub fn is_narrowed(&self) -> bool {
        self.department.is_some()
    }
}

/// スコープから導出したドキュメントパスの接頭辞
///
/// 例: `year/2024-2025/departments/computer-science/courses/bscs`
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub struct PathPrefix(String);

impl PathPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ドキュメントパスがこの接頭辞の配下にあるか
    ///
    /// セグメント単位で比較する。`departments/cs` は `departments/cs-lab/...` に一致しない。
    pub fn contains(&self, path: &str) -> bool {
        match path.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// スコープから導出したファイルストレージのキー接頭辞（末尾 `/` 付き）
///
/// 例: `2024-2025/computer-science/bscs/`
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub struct BlobPrefix(String);

impl BlobPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 文字列をパスセグメント用にスラッグ化する
///
/// ```
/// use thesisflow_domain::scope::slugify;
///
/// assert_eq!(slugify("  Computer Science! "), "computer-science");
/// assert_eq!(slugify("???"), "");
/// ```
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// 学科セグメント（未指定・空スラッグは `general`）
pub fn department_segment(department: Option<&str>) -> String {
    segment_or(department, DEPARTMENT_FALLBACK)
}

/// コースセグメント（未指定・空スラッグは `common`）
pub fn course_segment(course: Option<&str>) -> String {
    segment_or(course, COURSE_FALLBACK)
}

fn segment_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// スコープ解決器
///
/// 学年度が未指定のときは時刻プロバイダの現在時刻から学年度を決める。
pub struct ScopeResolver {
    clock: Arc<dyn Clock>,
}

impl ScopeResolver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// 入力からスコープを解決する
    ///
    /// # Errors
    ///
    /// - `course` があるのに `department` がない
    /// - `year` に `/` が含まれる（パスが壊れるため）
    pub fn resolve(&self, input: ScopeInput) -> Result<Scope, DomainError> {
        let year = normalize(input.year);
        let department = normalize(input.department);
        let course = normalize(input.course);

        if course.is_some() && department.is_none() {
            return Err(DomainError::validation(
                "course を指定する場合は department も指定してください",
            ));
        }

        let year = match year {
            Some(year) if year.contains('/') => {
                return Err(DomainError::validation(format!(
                    "year に '/' は使用できません: {year}"
                )));
            }
            Some(year) => year,
            None => AcademicYear::current(self.clock.as_ref()).label(),
        };

        Ok(Scope {
            year,
            department,
            course,
        })
    }
}
