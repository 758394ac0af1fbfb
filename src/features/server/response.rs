//! APIレスポンスの組み立て
use crate::shared::api_client::{ErrorDetail, ErrorResponse};
use crate::shared::errors::{AppError, ErrorSeverity};
use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use uuid::Uuid;

pub type ApiResponse = Response<Full<Bytes>>;

/// リクエストIDを返すヘッダー名
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// JSONレスポンスを作成する
///
/// # 引数
/// * `status` - HTTPステータス
/// * `body` - シリアライズする値
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> ApiResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => with_json_body(status, bytes),
        Err(e) => from_app_error(&AppError::from(e)),
    }
}

/// AppErrorをエラーレスポンスに変換する
pub fn from_app_error(error: &AppError) -> ApiResponse {
    let status = status_for(error);

    match error.severity() {
        ErrorSeverity::High => log::error!("リクエスト処理エラー: {}", error.details()),
        _ => log::warn!("リクエスト処理エラー: {}", error.details()),
    }

    // 内部エラーの詳細はクライアントに返さない
    let details = match error {
        AppError::Validation(_) | AppError::Json(_) => {
            Some(serde_json::Value::String(error.details()))
        }
        _ => None,
    };

    error_with(status, error.code(), error.user_message(), details)
}

/// 未対応パスのレスポンス（404）
pub fn not_found(path: &str) -> ApiResponse {
    error_with(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        "指定されたリソースが見つかりません",
        Some(serde_json::json!({ "path": path })),
    )
}

/// 許可されていないメソッドのレスポンス（405）
pub fn method_not_allowed(allowed: &'static str) -> ApiResponse {
    let mut response = error_with(
        StatusCode::METHOD_NOT_ALLOWED,
        "METHOD_NOT_ALLOWED",
        "許可されていないメソッドです",
        Some(serde_json::json!({ "allowed": allowed })),
    );
    response
        .headers_mut()
        .insert(hyper::header::ALLOW, HeaderValue::from_static(allowed));
    response
}

/// AppErrorに対応するHTTPステータス
pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_with(
    status: StatusCode,
    code: &str,
    message: &str,
    details: Option<serde_json::Value>,
) -> ApiResponse {
    let request_id = Uuid::new_v4().to_string();
    let body = ErrorResponse {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
            details,
            timestamp: Utc::now().with_timezone(&Tokyo).to_rfc3339(),
            request_id: request_id.clone(),
        },
    };

    // ErrorResponseのシリアライズは失敗しない
    let bytes = serde_json::to_vec(&body).unwrap_or_default();
    let mut response = with_json_body(status, bytes);
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn with_json_body(status: StatusCode, bytes: Vec<u8>) -> ApiResponse {
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    response
}
