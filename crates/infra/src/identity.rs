//! # 認証サービスクライアント
//!
//! 認証アカウントを管理する Identity Service への HTTP 通信を担当する。
//!
//! ## エンドポイント
//!
//! - `GET /internal/accounts?page_size=&page_token=` - アカウント ID の一覧
//! - `POST /internal/accounts/bulk-delete` - アカウントの一括削除（最大 1000 件）
//!
//! 接続失敗・タイムアウト・503 は [`InfraErrorKind::IdentityUnavailable`](crate::error::InfraErrorKind::IdentityUnavailable)
//! にマップする。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::InfraError,
    store::{AccountPage, BulkDeleteFailure, BulkDeleteResponse, IdentityProvider},
};

// --- リクエスト/レスポンス型 ---

#[derive(Debug, Deserialize)]
struct ListAccountsResponse {
    account_ids:     Vec<String>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct BulkDeleteRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct BulkDeleteErrorBody {
    index:   usize,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BulkDeleteResponseBody {
    success_count: u64,
    #[serde(default)]
    errors:        Vec<BulkDeleteErrorBody>,
}

/// HTTP 経由の [`IdentityProvider`]
pub struct HttpIdentityClient {
    base_url: String,
    client:   reqwest::Client,
}

impl HttpIdentityClient {
    /// 新しいクライアントを作成する
    ///
    /// - `base_url`: Identity Service のベース URL（例: `http://localhost:13010`）
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// 設定済みの `reqwest::Client` を使うクライアントを作成する
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn unexpected_status(response: reqwest::Response) -> InfraError {
        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return InfraError::identity_unavailable();
        }
        let body = response.text().await.unwrap_or_default();
        InfraError::identity(format!("予期しないステータス {status}: {body}"))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityClient {
    async fn list_accounts(
        &self,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<AccountPage, InfraError> {
        let url = format!("{}/internal/accounts", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("page_size", page_size.to_string())]);
        if let Some(token) = cursor {
            request = request.query(&[("page_token", token)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::unexpected_status(response).await);
        }

        let body = response.json::<ListAccountsResponse>().await?;
        Ok(AccountPage {
            account_ids: body.account_ids,
            next_cursor: body.next_page_token,
        })
    }

    async fn bulk_delete(&self, account_ids: &[String]) -> Result<BulkDeleteResponse, InfraError> {
        let url = format!("{}/internal/accounts/bulk-delete", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&BulkDeleteRequest { ids: account_ids })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::unexpected_status(response).await);
        }

        let body = response.json::<BulkDeleteResponseBody>().await?;
        Ok(BulkDeleteResponse {
            success_count: body.success_count,
            failures:      body
                .errors
                .into_iter()
                .map(|e| BulkDeleteFailure {
                    index:   e.index,
                    message: e.message,
                })
                .collect(),
        })
    }
}
