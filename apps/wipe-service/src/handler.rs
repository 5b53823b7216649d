//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//! ハンドラは入力の取り出しとレスポンス変換だけを行い、処理はユースケースに委譲する。

pub mod health;
pub mod wipe;

pub use health::health_check;
pub use wipe::{WipeState, wipe};
