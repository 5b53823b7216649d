//! # Wipe Service 設定
//!
//! 環境変数から Wipe Service の設定を読み込む。
//! 数値の不正やストアの上限を超える値は起動時に失敗させる。

use std::env;

use thesisflow_infra::{
    store::{MAX_BATCH_WRITE, MAX_IDENTITY_BATCH},
    wipe::WipeConfig,
};
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("{name} は 1 以上 {max} 以下である必要があります: {value}")]
    OutOfRange {
        name:  &'static str,
        value: usize,
        max:   usize,
    },
}

/// Wipe Service の設定
#[derive(Debug, Clone)]
pub struct WipeServiceConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// DynamoDB エンドポイント（DynamoDB Local 使用時に設定）
    pub dynamodb_endpoint: Option<String>,
    /// ドキュメントテーブル名
    pub documents_table_name: String,
    /// S3 エンドポイント URL（MinIO 使用時に設定、未設定で AWS S3 デフォルト）
    pub s3_endpoint_url: Option<String>,
    /// S3 バケット名
    pub s3_bucket_name: String,
    /// Identity Service のベース URL
    pub identity_service_url: String,
    /// ワイプの実行パラメータ
    pub wipe: WipeConfig,
}

impl WipeServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let defaults = WipeConfig::default();

        let port = required("WIPE_PORT")?;
        let port = port.parse().map_err(|_| ConfigError::Invalid {
            name:  "WIPE_PORT",
            value: port,
        })?;

        let batch_size = parse_or("WIPE_BATCH_SIZE", &lookup, defaults.batch_size)?;
        let identity_page_size =
            parse_or("WIPE_IDENTITY_PAGE_SIZE", &lookup, defaults.identity_page_size)?;
        let max_group_iterations = parse_or(
            "WIPE_MAX_GROUP_ITERATIONS",
            &lookup,
            defaults.max_group_iterations as usize,
        )?;

        let wipe = WipeConfig {
            batch_size:           within("WIPE_BATCH_SIZE", batch_size, MAX_BATCH_WRITE)?,
            identity_page_size:   within(
                "WIPE_IDENTITY_PAGE_SIZE",
                identity_page_size,
                MAX_IDENTITY_BATCH,
            )?,
            max_group_iterations: within(
                "WIPE_MAX_GROUP_ITERATIONS",
                max_group_iterations,
                u32::MAX as usize,
            )? as u32,
        };

        Ok(Self {
            host: lookup("WIPE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT"),
            documents_table_name: lookup("DOCUMENTS_TABLE_NAME")
                .unwrap_or_else(|| "documents".to_string()),
            s3_endpoint_url: lookup("S3_ENDPOINT_URL"),
            s3_bucket_name: required("S3_BUCKET_NAME")?,
            identity_service_url: required("IDENTITY_SERVICE_URL")?,
            wipe,
        })
    }
}

fn parse_or(
    name: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: usize,
) -> Result<usize, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn within(name: &'static str, value: usize, max: usize) -> Result<usize, ConfigError> {
    if (1..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { name, value, max })
    }
}
