/// APIサーバー経由での精算設定操作
use crate::features::metadata::models::Metadata;
use crate::shared::api_client::ApiClient;
use crate::shared::errors::AppResult;
use log::info;

/// 精算設定のエンドポイント
pub const METADATA_ENDPOINT: &str = "/api/metadata";

/// 精算設定を取得する（API Server経由）
pub async fn fetch_metadata(api_client: &ApiClient) -> AppResult<Metadata> {
    let metadata: Metadata = api_client.get(METADATA_ENDPOINT).await?;

    info!(
        "精算設定取得成功: categories={}",
        metadata.receipt_categories.len()
    );
    Ok(metadata)
}

/// 精算設定を保存する（API Server経由）
///
/// # 戻り値
/// サーバーに保存された設定
pub async fn save_metadata(api_client: &ApiClient, metadata: &Metadata) -> AppResult<Metadata> {
    let saved: Metadata = api_client.post(METADATA_ENDPOINT, metadata).await?;

    info!(
        "精算設定保存成功: categories={}",
        saved.receipt_categories.len()
    );
    Ok(saved)
}
