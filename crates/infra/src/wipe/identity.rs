//! # IdentityWiper
//!
//! 認証サービスのアカウントを全件削除する。
//!
//! 認証アカウントには学年度・学科の属性がないため、スコープに関係なく常に
//! グローバルに削除する。個別アカウントの削除失敗は集計して返し、ワイプ全体は
//! 止めない。

use std::sync::Arc;

use super::{IdentityFailure, IdentityWipeResult};
use crate::{
    error::InfraError,
    store::{IdentityProvider, MAX_IDENTITY_BATCH},
};

pub struct IdentityWiper {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityWiper {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// すべてのアカウントをページ単位で一括削除する
    ///
    /// # Errors
    ///
    /// 一覧取得または一括削除の呼び出し自体が失敗した場合。
    ///
    /// # Panics
    ///
    /// `page_size` が 0 または [`MAX_IDENTITY_BATCH`] を超える場合。
    #[tracing::instrument(skip(self), err)]
    pub async fn delete_all_accounts(
        &self,
        page_size: usize,
    ) -> Result<IdentityWipeResult, InfraError> {
        assert!(
            (1..=MAX_IDENTITY_BATCH).contains(&page_size),
            "page_size は 1..={MAX_IDENTITY_BATCH} の範囲で指定してください: {page_size}"
        );

        let mut result = IdentityWipeResult::default();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .provider
                .list_accounts(page_size, cursor.as_deref())
                .await?;

            if !page.account_ids.is_empty() {
                let response = self.provider.bulk_delete(&page.account_ids).await?;
                result.succeeded += response.success_count;

                for failure in response.failures {
                    let id = page
                        .account_ids
                        .get(failure.index)
                        .cloned()
                        .unwrap_or_else(|| format!("index:{}", failure.index));
                    tracing::warn!(account_id = %id, message = %failure.message, "アカウント削除に失敗");
                    result.failed += 1;
                    result.errors.push(IdentityFailure {
                        id,
                        message: failure.message,
                    });
                }
            }

            match page.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::info!(
            succeeded = result.succeeded,
            failed = result.failed,
            "認証アカウントの削除が完了"
        );
        Ok(result)
    }
}
