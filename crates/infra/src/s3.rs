//! # S3 ファイルストレージ
//!
//! 論文ファイル等の実体を格納する Amazon S3 / MinIO を [`BlobStore`] として提供する。
//!
//! - **ローカル開発**: MinIO を使用（`S3_ENDPOINT_URL` で接続先を指定）
//! - **本番環境**: IAM ロールによる認証で Amazon S3 に接続（`S3_ENDPOINT_URL` 未設定）
//!
//! オブジェクトキーは `{year}/{department}/{course}/...` の形で格納される。

use async_trait::async_trait;
use aws_sdk_s3::Client;

use crate::{
    error::InfraError,
    store::{BlobObject, BlobStore},
};

/// S3 クライアントを作成する
///
/// `endpoint` が `Some` の場合は MinIO 等のカスタムエンドポイントに接続する。
/// 認証情報は SDK のデフォルト認証チェーンで解決する。
pub async fn create_client(endpoint: Option<&str>) -> Client {
    let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new("ap-northeast-1"));

    if let Some(endpoint_url) = endpoint {
        config_builder = config_builder.endpoint_url(endpoint_url);
    }

    let config = config_builder.load().await;

    // MinIO はパススタイルが必要
    let s3_config_builder = aws_sdk_s3::config::Builder::from(&config);
    let s3_config = if endpoint.is_some() {
        s3_config_builder.force_path_style(true).build()
    } else {
        s3_config_builder.build()
    };

    Client::from_conf(s3_config)
}

/// S3 上の [`BlobStore`]
pub struct S3BlobStore {
    client:      Client,
    bucket_name: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<BlobObject>, InfraError> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let mut list = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                list = list.continuation_token(token);
            }

            let output = list
                .send()
                .await
                .map_err(|e| InfraError::s3(format!("オブジェクト一覧の取得に失敗: {e}")))?;

            objects.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .map(BlobObject::new),
            );

            continuation_token = output.next_continuation_token().map(str::to_string);
            if continuation_token.is_none() {
                break;
            }
        }

        tracing::debug!(prefix, count = objects.len(), "オブジェクト一覧を取得");
        Ok(objects)
    }

    async fn delete(&self, object: &BlobObject) -> Result<(), InfraError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(object.key())
            .send()
            .await
            .map_err(|e| {
                InfraError::s3(format!(
                    "オブジェクト '{}' の削除に失敗: {e}",
                    object.key()
                ))
            })?;
        Ok(())
    }
}
