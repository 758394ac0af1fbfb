/// 汎用APIクライアント
///
/// 精算APIサーバー（/api/metadata, /api/form）との通信を行う
use crate::shared::config::ApiConfig;
use crate::shared::errors::AppError;
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// APIサーバーからのエラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// 汎用APIクライアント
pub struct ApiClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
}

impl ApiClient {
    /// 環境設定からAPIクライアントを作成
    pub fn new() -> Result<Self, AppError> {
        Self::new_with_config(ApiConfig::from_env())
    }

    /// 設定を指定してAPIクライアントを作成
    pub fn new_with_config(config: ApiConfig) -> Result<Self, AppError> {
        config.validate()?;

        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Configuration(format!("ベースURLが不正です: {e}")))?;

        // パスの付いたベースURL（リバースプロキシ配下など）でもパスを保持して連結する
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self {
            client,
            base_url,
            max_retries: config.max_retries,
        })
    }

    /// エンドポイントの完全なURLを組み立てる
    fn endpoint_url(&self, endpoint: &str) -> Result<Url, AppError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| AppError::Configuration(format!("URLの組み立てに失敗: {endpoint} ({e})")))
    }

    /// GETリクエストを送信
    pub async fn get<T>(&self, endpoint: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        info!("GETリクエスト送信: endpoint={endpoint}");

        let url = self.endpoint_url(endpoint)?;
        let request = self
            .client
            .get(url)
            .header("Accept", "application/json");

        self.send_request_with_retry(request, "GET", endpoint).await
    }

    /// POSTリクエストを送信
    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        info!("POSTリクエスト送信: endpoint={endpoint}");

        let url = self.endpoint_url(endpoint)?;
        let request = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(body);

        self.send_request_with_retry(request, "POST", endpoint)
            .await
    }

    /// リトライ機能付きでリクエストを送信
    ///
    /// リトライするのは通信エラーのみ。サーバーが返した非2xxは即座にエラーとする
    async fn send_request_with_retry<T>(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        endpoint: &str,
    ) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let mut attempts = 0;
        loop {
            let cloned_request = request.try_clone().ok_or_else(|| {
                AppError::ExternalService("リクエストのクローンに失敗しました".to_string())
            })?;

            match cloned_request.send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let result: T = response.json().await.map_err(|e| {
                            AppError::ExternalService(format!("レスポンス解析エラー: {e}"))
                        })?;

                        info!("{method}リクエスト成功: endpoint={endpoint}");
                        return Ok(result);
                    }

                    let error_response = self.handle_error_response(response).await;
                    return Err(AppError::external_service(
                        "APIサーバーエラー".to_string(),
                        format!(
                            "{} - {}",
                            error_response.error.code, error_response.error.message
                        ),
                    ));
                }
                Err(e) => {
                    if attempts < self.max_retries {
                        attempts += 1;
                        let delay = retry_delay(attempts);
                        warn!(
                            "APIリクエスト失敗、リトライします: attempt={attempts}/{}, delay={delay:?}",
                            self.max_retries
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(AppError::ExternalService(format!(
                        "APIサーバーへの接続に失敗しました: {e}"
                    )));
                }
            }
        }
    }

    /// エラーレスポンスを処理し、詳細なエラー情報を提供
    async fn handle_error_response(&self, response: Response) -> ErrorResponse {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let response_text = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());

        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&response_text) {
            debug!(
                "APIサーバーから構造化エラーレスポンスを受信: code={}, message={}",
                error_response.error.code, error_response.error.message
            );
            return error_response;
        }

        let (error_code, user_message) = fallback_error(status_code);

        warn!("APIサーバーから非構造化エラーレスポンス: status={status_code}, body={response_text}");

        ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message: user_message.to_string(),
                details: Some(serde_json::json!({
                    "http_status": status_code,
                    "raw_response": response_text,
                })),
                timestamp: chrono::Utc::now().to_rfc3339(),
                request_id,
            },
        }
    }
}

/// リトライ前の待機時間（2^attempts 秒、最大60秒）
fn retry_delay(attempts: u32) -> Duration {
    const MAX_DELAY_SECS: u64 = 60;
    let secs = 2_u64
        .checked_pow(attempts)
        .map_or(MAX_DELAY_SECS, |secs| secs.min(MAX_DELAY_SECS));
    Duration::from_secs(secs)
}

/// JSONでないエラーレスポンス（プロキシ経由など）用のコードとメッセージ
fn fallback_error(status_code: u16) -> (&'static str, &'static str) {
    match status_code {
        400 => ("BAD_REQUEST", "送信内容を受け付けられませんでした"),
        404 => ("NOT_FOUND", "APIのパスが見つかりません"),
        405 => ("METHOD_NOT_ALLOWED", "このパスでは使用できないメソッドです"),
        500..=599 => ("SERVER_ERROR", "精算APIサーバーで障害が発生しています"),
        _ => ("UNKNOWN_ERROR", "予期しない応答を受信しました"),
    }
}
