//! # ワイプ対象カテゴリ
//!
//! 一括削除の単位。カテゴリごとに [`CategoryPlan`](crate::plan::CategoryPlan)
//! が 1 つ対応する。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

/// ワイプ対象カテゴリ
///
/// リクエストでは大文字小文字を区別せず、前後の空白を除去して受け付ける。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Category {
    /// ユーザーレコードと認証アカウント
    User,
    /// カレンダーとその予定
    Calendar,
    /// 予定のみ
    Event,
    /// 研究グループとその配下すべて（論文を含む）
    Group,
    /// 論文とその配下（章、提出物、チャットなど）
    Thesis,
    /// ファイルメタデータとファイル実体
    File,
    /// 監査ログ
    Audit,
}

impl Category {
    /// リクエスト値からカテゴリをパースする
    ///
    /// 未指定・空文字・未知の値はすべてバリデーションエラー。
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        let value = raw.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
            DomainError::validation("category は必須です")
        })?;

        value
            .parse::<Self>()
            .map_err(|_| DomainError::validation(format!("不明な category です: {value}")))
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[rstest]
    #[case("thesis", Category::Thesis)]
    #[case("  Thesis ", Category::Thesis)]
    #[case("GROUP", Category::Group)]
    #[case("user", Category::User)]
    #[case("Calendar", Category::Calendar)]
    #[case("event", Category::Event)]
    #[case("file", Category::File)]
    #[case("audit", Category::Audit)]
    fn test_parseは大文字小文字と前後空白を無視する(
        #[case] raw: &str,
        #[case] expected: Category,
    ) {
        assert_eq!(Category::parse(Some(raw)).unwrap(), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    #[case(Some("thesis-chapter"))]
    fn test_parseは未指定と未知の値を拒否する(#[case] raw: Option<&str>) {
        assert!(matches!(
            Category::parse(raw),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_as_strとdisplayは同じ小文字表記を返す() {
        for category in Category::iter() {
            assert_eq!(category.as_str(), category.to_string());
            assert_eq!(category.as_str(), category.as_str().to_lowercase());
        }
    }
}
