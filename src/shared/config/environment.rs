use crate::shared::errors::{AppError, AppResult};
use std::net::{IpAddr, SocketAddr};
use url::Url;

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        let environment = get_environment();
        let debug_mode = environment == Environment::Development;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if debug_mode {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            log_level,
        }
    }
}

/// 現在の実行環境を判定する
///
/// # 判定ロジック
/// 1. コンパイル時埋め込み環境変数を最優先
/// 2. 実行時環境変数 ENVIRONMENT を確認
/// 3. デバッグビルドの場合は Development
/// 4. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Some(embedded_env) = option_env!("EMBEDDED_ENVIRONMENT") {
        let env = parse_environment(embedded_env);
        log::debug!("環境判定: コンパイル時埋め込み値を使用 -> {embedded_env} -> {env:?}");
        return env;
    }

    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = parse_environment(&env_var);
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

fn parse_environment(value: &str) -> Environment {
    match value {
        "production" => Environment::Production,
        _ => Environment::Development,
    }
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # ファイル名の規則
/// - 開発環境: "dev_claims.db"
/// - プロダクション環境: "claims.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_claims.db",
        Environment::Production => "claims.db",
    }
}

/// 環境変数を取得する（優先順位: 起動時 > コンパイル時埋め込み値）
///
/// # 引数
/// * `var_name` - 環境変数名
/// * `embedded` - build.rs が埋め込んだ値（`option_env!` の結果）
///
/// # 戻り値
/// 環境変数の値、どちらにも無い場合はNone
pub fn lookup_env_var(var_name: &str, embedded: Option<&'static str>) -> Option<String> {
    if let Ok(value) = std::env::var(var_name) {
        log::debug!("環境変数 {var_name} を起動時の環境変数から取得しました");
        return Some(value);
    }

    embedded.map(|value| {
        log::debug!("環境変数 {var_name} をコンパイル時の環境変数から取得しました");
        value.to_string()
    })
}

/// 数値型の環境変数を取得する（パースに失敗した場合はデフォルト値）
fn lookup_parsed<T>(var_name: &str, embedded: Option<&'static str>, default_value: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup_env_var(var_name, embedded) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("{var_name}のパースに失敗しました。デフォルト値{default_value}を使用します");
            default_value
        }),
        None => default_value,
    }
}

/// 環境に応じた.envファイルを読み込む
pub fn load_environment_variables() {
    if let Some(env) = option_env!("EMBEDDED_ENVIRONMENT") {
        log::info!("コンパイル時埋め込み環境設定を使用: {env}");
        return;
    }

    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    log::info!("環境: {environment}, 読み込み対象: {env_file}");

    match dotenv::from_filename(env_file) {
        Ok(_) => {
            log::info!("{env_file}ファイルを読み込みました");
        }
        Err(_) => {
            if env_file != ".env" && dotenv::dotenv().is_ok() {
                log::warn!("{env_file}が見つからないため、デフォルトの.envファイルを読み込みました");
            } else {
                log::warn!("環境変数ファイルが見つかりません。コンパイル時埋め込み値または直接設定された環境変数を使用します。");
            }
        }
    }
}

/// ログシステムを初期化する
///
/// 二重初期化（テストなど）の場合は警告のみで続行する
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();

    let log_level = match env_config.log_level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    let result = env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    if let Err(e) = result {
        log::warn!("ログシステムは既に初期化されています: {e}");
        return;
    }

    log::info!(
        "ログシステムを初期化しました: level={}, environment={}",
        env_config.log_level,
        env_config.environment
    );
}

/// HTTPサーバーの設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 待ち受けホスト
    pub host: String,
    /// 待ち受けポート（0の場合は空きポートを自動割り当て）
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl ServerConfig {
    /// 環境変数からサーバー設定を読み込む
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = lookup_env_var("SERVER_HOST", option_env!("EMBEDDED_SERVER_HOST"))
            .unwrap_or(defaults.host);
        let port = lookup_parsed(
            "SERVER_PORT",
            option_env!("EMBEDDED_SERVER_PORT"),
            defaults.port,
        );

        log::info!("サーバー設定: host={host}, port={port}");
        Self { host, port }
    }

    /// 待ち受けアドレスを取得する
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|e| {
            AppError::configuration(format!("SERVER_HOSTが不正です: {} ({e})", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// APIクライアント側の設定
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// APIサーバーのベースURL
    pub base_url: String,
    /// APIリクエストのタイムアウト（秒）
    pub timeout_seconds: u64,
    /// 通信失敗時の最大リトライ回数（0はリトライなし）
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".to_string(),
            timeout_seconds: 30,
            max_retries: 0,
        }
    }
}

impl ApiConfig {
    /// 環境変数からAPI設定を読み込む
    pub fn from_env() -> Self {
        log::debug!("ApiConfig::from_env() - 環境変数の読み込みを開始");
        let defaults = Self::default();

        let base_url = lookup_env_var("API_BASE_URL", option_env!("EMBEDDED_API_BASE_URL"))
            .unwrap_or(defaults.base_url);
        let timeout_seconds = lookup_parsed(
            "API_TIMEOUT_SECONDS",
            option_env!("EMBEDDED_API_TIMEOUT_SECONDS"),
            defaults.timeout_seconds,
        );
        let max_retries = lookup_parsed(
            "API_MAX_RETRIES",
            option_env!("EMBEDDED_API_MAX_RETRIES"),
            defaults.max_retries,
        );

        log::info!(
            "API設定: base_url={base_url}, timeout={timeout_seconds}s, max_retries={max_retries}"
        );

        Self {
            base_url,
            timeout_seconds,
            max_retries,
        }
    }

    /// 設定を検証する
    pub fn validate(&self) -> AppResult<()> {
        Url::parse(&self.base_url).map_err(|e| {
            AppError::configuration(format!("APIサーバーのベースURLが不正です: {e}"))
        })?;

        if self.timeout_seconds == 0 {
            return Err(AppError::configuration(
                "APIタイムアウトは0より大きい値である必要があります",
            ));
        }

        Ok(())
    }
}
