pub mod features;
pub mod shared;

use features::claims::repository as claim_repository;
use features::metadata::repository as metadata_repository;
use features::server::ApiServer;
use log::{error, info, warn};
use rusqlite::Connection;
use shared::config::{
    initialize_logging_system, load_environment_variables, EnvironmentConfig, ServerConfig,
};
use shared::database::{get_database_path, initialize_database};
use shared::errors::AppResult;
use std::sync::{Arc, Mutex};

/// アプリケーション状態（データベース接続を保持）
pub struct AppState {
    pub db: Mutex<Connection>,
}

/// APIサーバーを起動し、Ctrl+Cを受け取るまで処理を続ける
pub async fn run() -> AppResult<()> {
    // 環境変数を読み込み（.envファイルがある場合）
    load_environment_variables();

    // ログシステムを初期化
    initialize_logging_system();

    info!("アプリケーション初期化を開始します...");
    let env_config = EnvironmentConfig::from_env();
    info!("実行環境: {}", env_config.environment);

    // アプリ起動時にデータベースを初期化
    info!("データベースを初期化しています...");
    let database_path = get_database_path()?;
    let db_conn = initialize_database(&database_path).map_err(|e| {
        error!("データベースの初期化に失敗しました: {e}");
        e
    })?;
    info!("データベースの初期化が完了しました");
    log_stored_data_summary(&db_conn)?;

    let state = Arc::new(AppState {
        db: Mutex::new(db_conn),
    });

    let server_config = ServerConfig::from_env();
    let server = ApiServer::bind(server_config.socket_addr()?, state).await?;

    info!("アプリケーション初期化が完了しました");

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("終了シグナルの待機に失敗しました: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await
}

/// 起動時に保存済みデータの状態をログ出力する
fn log_stored_data_summary(conn: &Connection) -> AppResult<()> {
    match metadata_repository::updated_at(conn)? {
        Some(updated_at) => info!("精算設定の最終更新: {updated_at}"),
        None => warn!("精算設定が未保存です。すべての請求額は0になります"),
    }

    let mismatched = claim_repository::count_mismatched(conn)?;
    if mismatched > 0 {
        warn!("クライアント計算の合計と一致しない請求があります: {mismatched}件");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::metadata::models::Metadata;
    use crate::shared::database::create_tables;

    #[test]
    fn test_log_stored_data_summary() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        assert!(log_stored_data_summary(&conn).is_ok());

        metadata_repository::save(&conn, &Metadata::default()).unwrap();
        assert!(log_stored_data_summary(&conn).is_ok());
    }
}
