use crate::features::metadata::models::{Metadata, ReceiptCategories};
use crate::shared::errors::AppResult;
use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use rusqlite::{params, Connection, OptionalExtension};

/// 精算設定を取得する
///
/// 一度も保存されていない場合はデフォルト値（すべて0、カテゴリなし）を返す
///
/// # 引数
/// * `conn` - データベース接続
pub fn load(conn: &Connection) -> AppResult<Metadata> {
    let rates = conn
        .query_row(
            "SELECT allowance_rate, mileage_rate, max_reimbursement
             FROM reimbursement_rates WHERE id = 1",
            [],
            |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?, row.get::<_, f64>(2)?)),
        )
        .optional()?;

    let mut metadata = match rates {
        Some((allowance_rate, mileage_rate, max_reimbursement)) => Metadata {
            allowance_rate,
            mileage_rate,
            max_reimbursement,
            receipt_categories: ReceiptCategories::new(),
        },
        None => Metadata::default(),
    };

    let mut stmt =
        conn.prepare("SELECT name, max_price FROM receipt_categories ORDER BY position ASC")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?;

    for row in rows {
        let (name, max_price) = row?;
        metadata.receipt_categories.insert(name, max_price);
    }

    Ok(metadata)
}

/// 精算設定を保存する（既存の設定はすべて上書き）
///
/// # 引数
/// * `conn` - データベース接続
/// * `metadata` - 保存する設定
///
/// # 戻り値
/// 保存後の設定
pub fn save(conn: &Connection, metadata: &Metadata) -> AppResult<Metadata> {
    // JSTで現在時刻を取得
    let now = Utc::now().with_timezone(&Tokyo).to_rfc3339();

    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO reimbursement_rates (id, allowance_rate, mileage_rate, max_reimbursement, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            allowance_rate = excluded.allowance_rate,
            mileage_rate = excluded.mileage_rate,
            max_reimbursement = excluded.max_reimbursement,
            updated_at = excluded.updated_at",
        params![
            metadata.allowance_rate,
            metadata.mileage_rate,
            metadata.max_reimbursement,
            now
        ],
    )?;

    tx.execute("DELETE FROM receipt_categories", [])?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO receipt_categories (name, max_price, position) VALUES (?1, ?2, ?3)",
        )?;
        for (position, (name, max_price)) in metadata.receipt_categories.iter().enumerate() {
            stmt.execute(params![name, max_price, position as i64])?;
        }
    }

    tx.commit()?;

    log::info!(
        "精算設定を保存しました: categories={}",
        metadata.receipt_categories.len()
    );

    load(conn)
}

/// 最終更新日時を取得する（未保存の場合はNone）
pub fn updated_at(conn: &Connection) -> AppResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT updated_at FROM reimbursement_rates WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}
