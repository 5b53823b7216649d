//! # ユースケース層
//!
//! Wipe Service のビジネスロジックを実装する。
//!
//! - **依存性注入**: ストアはオーケストレーター経由で `Arc<dyn Trait>` として注入
//! - **薄いハンドラ**: ハンドラは入力の取り出しとレスポンス変換だけを行う

pub mod wipe;

pub use wipe::{WipeRequest, WipeUseCaseImpl};
