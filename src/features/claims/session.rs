use crate::features::claims::{api_commands, form::ClaimForm, models::SubmissionReceipt};
use crate::features::metadata::{api_commands as metadata_api, models::Metadata};
use crate::shared::api_client::ApiClient;
use crate::shared::errors::AppResult;
use log::error;

/// 請求フォーム1回分の状態（精算設定と入力内容）
#[derive(Debug, Default)]
pub struct ClaimFormSession {
    metadata: Metadata,
    form: ClaimForm,
}

impl ClaimFormSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn form(&self) -> &ClaimForm {
        &self.form
    }

    /// フォームを編集する
    pub fn edit<F>(&mut self, operation: F)
    where
        F: FnOnce(&mut ClaimForm),
    {
        operation(&mut self.form);
    }

    /// 現在の入力と精算設定での合計額
    pub fn total_cost(&self) -> f64 {
        self.form.total_cost(&self.metadata)
    }

    /// サーバーから精算設定を読み込む
    ///
    /// 失敗した場合は現在の設定のまま
    pub async fn load_metadata(&mut self, api_client: &ApiClient) -> AppResult<()> {
        match metadata_api::fetch_metadata(api_client).await {
            Ok(metadata) => {
                self.metadata = metadata;
                Ok(())
            }
            Err(e) => {
                error!("精算設定の読み込みに失敗しました: {e}");
                Err(e)
            }
        }
    }

    /// 請求を送信する
    ///
    /// # 戻り値
    /// 受付結果。成功時は入力内容を破棄し、失敗時は入力内容を残す
    pub async fn submit(&mut self, api_client: &ApiClient) -> AppResult<SubmissionReceipt> {
        let submission = self.form.submission(&self.metadata);

        match api_commands::submit_claim(api_client, &submission).await {
            Ok(receipt) => {
                self.form = ClaimForm::new();
                Ok(receipt)
            }
            Err(e) => {
                error!("請求の送信に失敗しました: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::ApiConfig;
    use chrono::NaiveDate;
    use std::net::TcpListener;

    fn unreachable_client() -> ApiClient {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        ApiClient::new_with_config(ApiConfig {
            base_url: format!("http://127.0.0.1:{port}"),
            timeout_seconds: 2,
            max_retries: 0,
        })
        .unwrap()
    }

    #[test]
    fn test_total_before_metadata_is_loaded() {
        let mut session = ClaimFormSession::new();
        session.edit(|form| {
            form.set_trip_period(
                NaiveDate::from_ymd_opt(2024, 5, 1),
                NaiveDate::from_ymd_opt(2024, 5, 3),
            )
        });
        // 設定未読み込みの間は支給上限0
        assert_eq!(session.total_cost(), 0.0);
        assert_eq!(session.form().allowance_days(), 3);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_metadata() {
        let api_client = unreachable_client();
        let mut session = ClaimFormSession::new();

        let result = session.load_metadata(&api_client).await;
        assert!(result.is_err());
        assert_eq!(session.metadata(), &Metadata::default());
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_form() {
        let api_client = unreachable_client();
        let mut session = ClaimFormSession::new();
        session.edit(|form| {
            form.add_receipt();
            form.set_mileage(Some(12.0));
        });

        let result = session.submit(&api_client).await;
        assert!(result.is_err());
        assert_eq!(session.form().receipts().len(), 1);
        assert_eq!(session.form().mileage(), 12.0);
    }
}
