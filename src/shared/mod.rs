/// 精算APIサーバー用HTTPクライアント
pub mod api_client;

/// 共有設定管理
pub mod config;

/// 共有データベース接続管理
pub mod database;

/// 共有エラー型とエラーハンドリング
pub mod errors;

// 便利な再エクスポート
pub use api_client::ApiClient;
pub use config::{
    get_database_filename, get_environment, initialize_logging_system,
    load_environment_variables, ApiConfig, Environment, EnvironmentConfig, ServerConfig,
};
pub use database::{create_tables, get_database_path, initialize_database};
pub use errors::{AppError, AppResult, ErrorSeverity};
