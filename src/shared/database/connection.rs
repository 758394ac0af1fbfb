use crate::shared::config::{get_database_filename, get_environment};
use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// アプリケーションデータディレクトリ名
const APP_DATA_DIR_NAME: &str = "trip-claims";

/// データベース接続を初期化し、テーブルを作成する
///
/// # 引数
/// * `database_path` - データベースファイルのパス
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
pub fn initialize_database(database_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::configuration(format!("データディレクトリの作成に失敗: {e}"))
            })?;
            log::info!("データディレクトリを作成: {parent:?}");
        }
    }

    let conn = Connection::open(database_path)?;
    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {database_path:?}");

    Ok(conn)
}

/// データベースファイルパスを取得する
///
/// # 取得順序
/// 1. 環境変数 DATABASE_PATH
/// 2. OSのデータディレクトリ配下の trip-claims/
pub fn get_database_path() -> AppResult<PathBuf> {
    if let Ok(path) = std::env::var("DATABASE_PATH") {
        log::debug!("DATABASE_PATH を使用: {path}");
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_dir().ok_or_else(|| {
        AppError::configuration("データディレクトリを特定できません。DATABASE_PATHを設定してください")
    })?;

    let db_filename = get_database_filename(get_environment());
    Ok(data_dir.join(APP_DATA_DIR_NAME).join(db_filename))
}

/// データベーステーブルを作成する
///
/// # 引数
/// * `conn` - データベース接続
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    create_metadata_tables(conn)?;
    create_claim_tables(conn)?;
    create_indexes(conn)?;

    Ok(())
}

/// 精算設定（レート・上限・領収書カテゴリ）のテーブルを作成する
fn create_metadata_tables(conn: &Connection) -> AppResult<()> {
    // レートは常に1行のみ
    conn.execute(
        "CREATE TABLE IF NOT EXISTS reimbursement_rates (
            id INTEGER PRIMARY KEY CHECK(id = 1),
            allowance_rate REAL NOT NULL CHECK(allowance_rate >= 0),
            mileage_rate REAL NOT NULL CHECK(mileage_rate >= 0),
            max_reimbursement REAL NOT NULL CHECK(max_reimbursement >= 0),
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS receipt_categories (
            name TEXT PRIMARY KEY CHECK(name <> ''),
            max_price REAL NOT NULL CHECK(max_price >= 0),
            position INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// 請求テーブルを作成する
fn create_claim_tables(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS claims (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            allowance_days INTEGER NOT NULL CHECK(allowance_days >= 0),
            allowance_rate REAL NOT NULL,
            mileage REAL NOT NULL CHECK(mileage >= 0),
            mileage_rate REAL NOT NULL,
            client_total REAL NOT NULL,
            computed_total REAL NOT NULL,
            total_mismatch INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS claim_receipts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            claim_id INTEGER NOT NULL REFERENCES claims(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            category TEXT,
            price REAL NOT NULL CHECK(price >= 0)
        )",
        [],
    )?;

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_receipt_categories_position ON receipt_categories(position)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_claim_receipts_claim ON claim_receipts(claim_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_claims_created_at ON claims(created_at)",
        [],
    )?;

    Ok(())
}
