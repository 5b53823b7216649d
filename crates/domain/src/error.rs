//! # ドメイン層エラー定義
//!
//! ワイプ要求の入力検証で発生するエラー。
//! いずれもデータストアへのアクセス前に検出され、入力を直せば回復できる。
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 不明なカテゴリ、学科なしのコース指定など |

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// - カテゴリが未指定、または未知の値
    /// - `course` が指定されているのに `department` が未指定
    /// - 学年度ラベルにパス区切り文字が含まれる
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
