/// APIサーバー経由での請求送信
use crate::features::claims::models::{ClaimSubmission, SubmissionReceipt};
use crate::shared::api_client::ApiClient;
use crate::shared::errors::AppResult;
use log::{info, warn};

/// 請求フォームのエンドポイント
pub const FORM_ENDPOINT: &str = "/api/form";

/// 請求を送信する（API Server経由）
///
/// # 引数
/// * `api_client` - APIクライアント
/// * `submission` - 送信する請求
///
/// # 戻り値
/// サーバーの受付結果
pub async fn submit_claim(
    api_client: &ApiClient,
    submission: &ClaimSubmission,
) -> AppResult<SubmissionReceipt> {
    let receipt: SubmissionReceipt = api_client.post(FORM_ENDPOINT, submission).await?;

    if receipt.total_mismatch {
        warn!(
            "サーバーの計算結果と一致しません: client={}, server={}",
            receipt.client_sum_of_costs, receipt.sum_of_costs
        );
    }

    info!(
        "請求送信成功: id={}, total={}",
        receipt.id, receipt.sum_of_costs
    );
    Ok(receipt)
}
