use crate::features::metadata::{models::Metadata, repository};
use crate::shared::errors::{AppError, AppResult};
use crate::AppState;

/// 精算設定を取得する（GET /api/metadata）
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 保存済みの設定（未保存の場合はデフォルト値）
pub fn get_metadata(state: &AppState) -> AppResult<Metadata> {
    let db = state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロック取得失敗: {e}")))?;

    repository::load(&db)
}

/// 精算設定を保存する（POST /api/metadata）
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `metadata` - 新しい設定（既存の設定を完全に置き換える）
///
/// # 戻り値
/// 保存後の設定
pub fn save_metadata(state: &AppState, metadata: Metadata) -> AppResult<Metadata> {
    metadata.validate()?;

    let db = state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロック取得失敗: {e}")))?;

    repository::save(&db, &metadata)
}
