//! # DynamoDB ドキュメントストア
//!
//! 階層パスを持つドキュメントを 1 つの DynamoDB テーブルに格納し、
//! [`DocumentStore`] として提供する。
//!
//! ## テーブルスキーマ
//!
//! | 属性 | 役割 | 例 |
//! |------|------|----|
//! | `collection` (PK) | コレクション名 | `thesis` |
//! | `path` (SK) | ドキュメントのフルパス | `year/2024-2025/.../thesis/t1` |
//!
//! - グループ検索: `collection` で Query（`path` 昇順）
//! - コレクションパス指定: コレクション名の `collection` に加えて、`path` が
//!   `{コレクションパス}/` で始まるものに絞って Query
//!
//! 削除直後の再取得で削除済みのキーを数え直さないよう、検索は常に強い整合性で読む。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use thesisflow_infra::dynamodb;
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = dynamodb::create_client(Some("http://localhost:18000")).await;
//!     dynamodb::ensure_document_table(&client, "documents").await?;
//!     Ok(())
//! }
//! ```

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    types::{
        AttributeDefinition,
        AttributeValue,
        BillingMode,
        DeleteRequest,
        KeySchemaElement,
        KeyType,
        ScalarAttributeType,
        WriteRequest,
    },
};

use crate::{
    error::InfraError,
    store::{DocumentQuery, DocumentRef, DocumentStore},
};

const COLLECTION_ATTR: &str = "collection";
const PATH_ATTR: &str = "path";

/// BatchWriteItem 1 回あたりの上限
const BATCH_WRITE_CHUNK: usize = 25;

/// リトライ設定
const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF_MS: u64 = 5_000;

/// exponential backoff の待機時間を計算する
fn compute_backoff_ms(retry: u32) -> u64 {
    let backoff = INITIAL_BACKOFF_MS.saturating_mul(2u64.pow(retry));
    backoff.min(MAX_BACKOFF_MS)
}

/// DynamoDB クライアントを作成する
///
/// `endpoint` が `Some` の場合は DynamoDB Local に接続する。認証情報はダミー値を使う
/// （DynamoDB Local は認証情報を検証しない）。
/// `None` の場合は SDK のデフォルト認証チェーンで AWS に接続する。
pub async fn create_client(endpoint: Option<&str>) -> Client {
    let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new("ap-northeast-1"));

    if let Some(endpoint_url) = endpoint {
        config_builder = config_builder
            .endpoint_url(endpoint_url)
            .credentials_provider(aws_sdk_dynamodb::config::Credentials::new(
                "local", "local", None, None, "local",
            ));
    }

    let config = config_builder.load().await;
    Client::new(&config)
}

fn key_schema(attribute: &str, key_type: KeyType) -> Result<KeySchemaElement, InfraError> {
    KeySchemaElement::builder()
        .attribute_name(attribute)
        .key_type(key_type)
        .build()
        .map_err(|e| InfraError::dynamo_db(format!("KeySchema 構築エラー: {e}")))
}

fn string_attribute(attribute: &str) -> Result<AttributeDefinition, InfraError> {
    AttributeDefinition::builder()
        .attribute_name(attribute)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| InfraError::dynamo_db(format!("AttributeDefinition 構築エラー: {e}")))
}

/// ドキュメントテーブルが存在しなければ作成する（冪等）
pub async fn ensure_document_table(client: &Client, table_name: &str) -> Result<(), InfraError> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(_) => {
            tracing::debug!("テーブル '{}' は既に存在します", table_name);
            return Ok(());
        }
        Err(err) => {
            let not_found = err
                .as_service_error()
                .is_some_and(|e| e.is_resource_not_found_exception());
            if !not_found {
                return Err(InfraError::dynamo_db(format!(
                    "テーブル '{table_name}' の確認に失敗: {err}"
                )));
            }
        }
    }

    tracing::info!("テーブル '{}' を作成します", table_name);

    let create_result = client
        .create_table()
        .table_name(table_name)
        .key_schema(key_schema(COLLECTION_ATTR, KeyType::Hash)?)
        .key_schema(key_schema(PATH_ATTR, KeyType::Range)?)
        .attribute_definitions(string_attribute(COLLECTION_ATTR)?)
        .attribute_definitions(string_attribute(PATH_ATTR)?)
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    if let Err(err) = create_result {
        // 並行起動でテーブルが作成中の場合は成功扱い
        let in_use = err
            .as_service_error()
            .is_some_and(|e| e.is_resource_in_use_exception());
        if !in_use {
            return Err(InfraError::dynamo_db(format!(
                "テーブル '{table_name}' の作成に失敗: {err}"
            )));
        }
        tracing::debug!(
            "テーブル '{}' は既に作成中または存在します（ResourceInUseException）",
            table_name
        );
        return Ok(());
    }

    tracing::info!("テーブル '{}' を作成しました", table_name);
    Ok(())
}

/// DynamoDB 上の [`DocumentStore`]
pub struct DynamoDbDocumentStore {
    client:     Client,
    table_name: String,
}

impl DynamoDbDocumentStore {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    fn delete_request(doc: &DocumentRef) -> Result<WriteRequest, InfraError> {
        let key = HashMap::from([
            (
                COLLECTION_ATTR.to_string(),
                AttributeValue::S(doc.collection_name().to_string()),
            ),
            (PATH_ATTR.to_string(), AttributeValue::S(doc.path().to_string())),
        ]);
        let delete = DeleteRequest::builder()
            .set_key(Some(key))
            .build()
            .map_err(|e| InfraError::dynamo_db(format!("DeleteRequest 構築エラー: {e}")))?;
        Ok(WriteRequest::builder().delete_request(delete).build())
    }

    /// 25 件以下の削除リクエストを、未処理アイテムをリトライしながら書き込む
    async fn write_chunk(&self, requests: Vec<WriteRequest>) -> Result<(), InfraError> {
        let mut remaining_requests = requests;

        for retry in 0..=MAX_RETRIES {
            if retry > 0 {
                let backoff = compute_backoff_ms(retry - 1);
                tracing::warn!(
                    retry = retry,
                    unprocessed = remaining_requests.len(),
                    backoff_ms = backoff,
                    "DynamoDB BatchWriteItem: 未処理アイテムをリトライ"
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let output = self
                .client
                .batch_write_item()
                .request_items(&self.table_name, remaining_requests)
                .send()
                .await
                .map_err(|e| InfraError::dynamo_db(format!("ドキュメントの削除に失敗: {e}")))?;

            let unprocessed = output
                .unprocessed_items()
                .and_then(|items| items.get(&self.table_name))
                .cloned()
                .unwrap_or_default();

            if unprocessed.is_empty() {
                return Ok(());
            }
            remaining_requests = unprocessed;
        }

        tracing::error!(
            unprocessed = remaining_requests.len(),
            "DynamoDB BatchWriteItem: リトライ上限超過、未処理アイテムが残存"
        );
        Err(InfraError::dynamo_db(format!(
            "ドキュメントの削除でリトライ上限超過: {}件が未処理",
            remaining_requests.len()
        )))
    }
}

/// Query のキー条件
#[derive(Debug)]
struct KeyCondition {
    expression:  String,
    values:      HashMap<String, AttributeValue>,
    /// この接頭辞で始まらない結果は対象外（パス昇順なので最初の不一致で打ち切る）
    path_prefix: Option<String>,
}

impl KeyCondition {
    fn for_query(query: &DocumentQuery) -> Self {
        let mut values = HashMap::new();

        if query.group {
            values.insert(":hash".to_string(), AttributeValue::S(query.collection.clone()));
            let mut expression = String::from("#hash = :hash");
            if let Some(after) = &query.start_after {
                expression.push_str(" AND #path > :after");
                values.insert(":after".to_string(), AttributeValue::S(after.clone()));
            }
            return Self {
                expression,
                values,
                path_prefix: None,
            };
        }

        // コレクションパスの最後のセグメントがパーティションキー
        let name = query.collection.rsplit('/').next().unwrap_or_default();
        let prefix = format!("{}/", query.collection);
        values.insert(":hash".to_string(), AttributeValue::S(name.to_string()));

        // begins_with と範囲条件はキー条件で併用できないため、カーソルがあるときは
        // `>` で読み進め、接頭辞の判定はクライアント側で行う
        let expression = match &query.start_after {
            Some(after) if after.starts_with(&prefix) => {
                values.insert(":after".to_string(), AttributeValue::S(after.clone()));
                "#hash = :hash AND #path > :after".to_string()
            }
            _ => {
                values.insert(":prefix".to_string(), AttributeValue::S(prefix.clone()));
                "#hash = :hash AND begins_with(#path, :prefix)".to_string()
            }
        };

        Self {
            expression,
            values,
            path_prefix: Some(prefix),
        }
    }
}

#[async_trait]
impl DocumentStore for DynamoDbDocumentStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<DocumentRef>, InfraError> {
        let limit = i32::try_from(query.limit)
            .map_err(|_| InfraError::unexpected(format!("limit が大きすぎます: {}", query.limit)))?;
        let condition = KeyCondition::for_query(query);

        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression(condition.expression)
            .expression_attribute_names("#hash", COLLECTION_ATTR)
            .expression_attribute_names("#path", PATH_ATTR)
            .set_expression_attribute_values(Some(condition.values))
            .projection_expression("#path")
            .consistent_read(true)
            .limit(limit)
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "コレクション '{}' の検索に失敗: {e}",
                    query.collection
                ))
            })?;

        let docs = output
            .items()
            .iter()
            .map(|item| match item.get(PATH_ATTR) {
                Some(AttributeValue::S(path)) => Ok(DocumentRef::new(path.as_str())),
                _ => Err(InfraError::dynamo_db("path 属性のないアイテムがあります")),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match condition.path_prefix {
            Some(prefix) => docs
                .into_iter()
                .take_while(|doc| doc.path().starts_with(&prefix))
                .collect(),
            None => docs,
        })
    }

    async fn batch_delete(&self, refs: &[DocumentRef]) -> Result<(), InfraError> {
        for chunk in refs.chunks(BATCH_WRITE_CHUNK) {
            let requests = chunk
                .iter()
                .map(Self::delete_request)
                .collect::<Result<Vec<_>, _>>()?;
            self.write_chunk(requests).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_send_syncを満たす() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DynamoDbDocumentStore>();
    }

    #[test]
    fn test_compute_backoff_msがリトライ0回目で100msを返す() {
        assert_eq!(compute_backoff_ms(0), 100);
    }

    #[test]
    fn test_compute_backoff_msがリトライ4回目で1600msを返す() {
        assert_eq!(compute_backoff_ms(4), 1600);
    }

    #[test]
    fn test_compute_backoff_msが上限5000msを超えない() {
        assert_eq!(compute_backoff_ms(10), 5_000);
    }

    #[test]
    fn test_グループ検索はコレクション名とカーソルをキー条件にする() {
        let query = DocumentQuery::group("thesis", 10).start_after(Some("year/a".to_string()));

        let condition = KeyCondition::for_query(&query);

        assert_eq!(condition.expression, "#hash = :hash AND #path > :after");
        assert_eq!(
            condition.values.get(":hash"),
            Some(&AttributeValue::S("thesis".to_string()))
        );
        assert_eq!(condition.path_prefix, None);
    }

    #[test]
    fn test_コレクションパス指定はテーブル本体をパス接頭辞で検索する() {
        let query = DocumentQuery::collection("systemAudits", 500);

        let condition = KeyCondition::for_query(&query);

        assert_eq!(
            condition.expression,
            "#hash = :hash AND begins_with(#path, :prefix)"
        );
        assert_eq!(
            condition.values.get(":hash"),
            Some(&AttributeValue::S("systemAudits".to_string()))
        );
        assert_eq!(
            condition.values.get(":prefix"),
            Some(&AttributeValue::S("systemAudits/".to_string()))
        );
        assert_eq!(condition.path_prefix.as_deref(), Some("systemAudits/"));
    }

    #[test]
    fn test_コレクションパス指定のカーソルは範囲条件になる() {
        let query = DocumentQuery::collection("year/2024-2025/departments/cs/users", 500)
            .start_after(Some("year/2024-2025/departments/cs/users/u1".to_string()));

        let condition = KeyCondition::for_query(&query);

        assert_eq!(condition.expression, "#hash = :hash AND #path > :after");
        assert_eq!(
            condition.values.get(":hash"),
            Some(&AttributeValue::S("users".to_string()))
        );
        assert_eq!(
            condition.path_prefix.as_deref(),
            Some("year/2024-2025/departments/cs/users/")
        );
    }

    #[test]
    fn test_削除リクエストはコレクション名とパスをキーにする() {
        let doc = DocumentRef::new("year/2024-2025/departments/cs/groups/g1/thesis/t1");

        let request = DynamoDbDocumentStore::delete_request(&doc).unwrap();

        let key = request.delete_request().unwrap().key();
        assert_eq!(
            key.get(COLLECTION_ATTR),
            Some(&AttributeValue::S("thesis".to_string()))
        );
        assert_eq!(
            key.get(PATH_ATTR),
            Some(&AttributeValue::S(doc.path().to_string()))
        );
    }
}
