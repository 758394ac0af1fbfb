use crate::features::claims::{commands as claim_commands, models::ClaimSubmission};
use crate::features::metadata::{commands as metadata_commands, models::Metadata};
use crate::features::server::response::{self, ApiResponse};
use crate::shared::errors::AppError;
use crate::AppState;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::{Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;

/// HTTPリクエストを処理する
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<ApiResponse, Infallible> {
    let (parts, body) = req.into_parts();
    log::debug!("リクエストを受信: {} {}", parts.method, parts.uri);

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            log::warn!("リクエストボディの読み取りに失敗しました: {e}");
            return Ok(response::from_app_error(&AppError::validation(
                "リクエストボディを読み取れません",
            )));
        }
    };

    Ok(route(&state, &parts.method, parts.uri.path(), &bytes))
}

/// メソッドとパスに応じてコマンドを呼び出す
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `method` - HTTPメソッド
/// * `path` - リクエストパス
/// * `body` - リクエストボディ
///
/// # 戻り値
/// JSONレスポンス
pub fn route(state: &AppState, method: &Method, path: &str, body: &[u8]) -> ApiResponse {
    match (method, path) {
        (&Method::GET, "/api/metadata") => match metadata_commands::get_metadata(state) {
            Ok(metadata) => response::json(StatusCode::OK, &metadata),
            Err(e) => response::from_app_error(&e),
        },
        (&Method::POST, "/api/metadata") => {
            let result = parse_body::<Metadata>(body)
                .and_then(|metadata| metadata_commands::save_metadata(state, metadata));
            match result {
                Ok(saved) => response::json(StatusCode::OK, &saved),
                Err(e) => response::from_app_error(&e),
            }
        }
        (_, "/api/metadata") => response::method_not_allowed("GET, POST"),
        (&Method::POST, "/api/form") => {
            let result = parse_body::<ClaimSubmission>(body)
                .and_then(|submission| claim_commands::submit_claim(state, submission));
            match result {
                Ok(receipt) => response::json(StatusCode::CREATED, &receipt),
                Err(e) => response::from_app_error(&e),
            }
        }
        (_, "/api/form") => response::method_not_allowed("POST"),
        _ => {
            log::debug!("未対応のリクエスト: {method} {path}");
            response::not_found(path)
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::create_tables;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn create_test_state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        AppState {
            db: Mutex::new(conn),
        }
    }

    async fn body_bytes(response: ApiResponse) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    async fn body_json(response: ApiResponse) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_get_metadata_defaults() {
        let state = create_test_state();
        let response = route(&state, &Method::GET, "/api/metadata", b"");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["allowanceRate"], 0.0);
        assert_eq!(body["receipts"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_post_metadata_then_get_keeps_order() {
        let state = create_test_state();
        let payload = br#"{"allowanceRate":50,"mileageRate":0.5,"maxReimbursement":500,
            "receipts":{"taxi":40,"meals":100,"hotel":250}}"#;

        let response = route(&state, &Method::POST, "/api/metadata", payload);
        assert_eq!(response.status(), StatusCode::OK);

        let response = route(&state, &Method::GET, "/api/metadata", b"");
        let bytes = body_bytes(response).await;
        let text = String::from_utf8(bytes).unwrap();
        let taxi = text.find("taxi").unwrap();
        let meals = text.find("meals").unwrap();
        let hotel = text.find("hotel").unwrap();
        assert!(taxi < meals && meals < hotel);
    }

    #[tokio::test]
    async fn test_post_form_returns_created() {
        let state = create_test_state();
        route(
            &state,
            &Method::POST,
            "/api/metadata",
            br#"{"allowanceRate":50,"mileageRate":0.5,"maxReimbursement":500,"receipts":{"meals":100}}"#,
        );

        let payload = br#"{"receipts":{"0":{"type":"meals","price":80}},"allowance":3,
            "allowanceRate":50,"mileage":20,"mileageRate":0.5,"sumOfCosts":240}"#;
        let response = route(&state, &Method::POST, "/api/form", payload);
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["sumOfCosts"], 240.0);
        assert_eq!(body["totalMismatch"], false);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let state = create_test_state();
        let response = route(&state, &Method::POST, "/api/form", b"{not json");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_invalid_metadata_is_bad_request() {
        let state = create_test_state();
        let payload = br#"{"allowanceRate":-1,"mileageRate":0,"maxReimbursement":0,"receipts":{}}"#;
        let response = route(&state, &Method::POST, "/api/metadata", payload);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_duplicate_category_names_are_bad_request() {
        let state = create_test_state();
        let payload = br#"{"allowanceRate":50,"mileageRate":0.5,"maxReimbursement":500,
            "receipts":{"meals":100,"meals":20}}"#;
        let response = route(&state, &Method::POST, "/api/metadata", payload);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");

        let stored = metadata_commands::get_metadata(&state).unwrap();
        assert!(stored.receipt_categories.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_path_and_wrong_method() {
        let state = create_test_state();
        let response = route(&state, &Method::GET, "/api/unknown", b"");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = route(&state, &Method::GET, "/api/form", b"");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = route(&state, &Method::DELETE, "/api/metadata", b"");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
