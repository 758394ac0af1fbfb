use crate::features::claims::models::{ClaimReceipt, CreateClaimDto, StoredClaim};
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use rusqlite::{params, Connection};

/// 請求を保存する（領収書も同じトランザクションで保存）
///
/// # 引数
/// * `conn` - データベース接続
/// * `dto` - 請求保存用DTO
///
/// # 戻り値
/// 保存された請求、または失敗時はエラー
pub fn create(conn: &Connection, dto: CreateClaimDto) -> AppResult<StoredClaim> {
    // JSTで現在時刻を取得
    let now = Utc::now().with_timezone(&Tokyo).to_rfc3339();
    let total_mismatch = dto.total_mismatch();

    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO claims (allowance_days, allowance_rate, mileage, mileage_rate,
                             client_total, computed_total, total_mismatch, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            dto.allowance_days,
            dto.allowance_rate,
            dto.mileage,
            dto.mileage_rate,
            dto.client_total,
            dto.computed_total,
            total_mismatch,
            now
        ],
    )?;

    let id = tx.last_insert_rowid();

    {
        let mut stmt = tx.prepare(
            "INSERT INTO claim_receipts (claim_id, position, category, price)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (position, receipt) in dto.receipts.iter().enumerate() {
            stmt.execute(params![id, position as i64, receipt.category, receipt.price])?;
        }
    }

    tx.commit()?;

    find_by_id(conn, id)
}

/// IDで請求を取得する
pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<StoredClaim> {
    let mut claim = conn
        .query_row(
            "SELECT id, allowance_days, allowance_rate, mileage, mileage_rate,
                    client_total, computed_total, total_mismatch, created_at
             FROM claims WHERE id = ?1",
            params![id],
            |row| {
                Ok(StoredClaim {
                    id: row.get(0)?,
                    receipts: Vec::new(),
                    allowance_days: row.get(1)?,
                    allowance_rate: row.get(2)?,
                    mileage: row.get(3)?,
                    mileage_rate: row.get(4)?,
                    client_total: row.get(5)?,
                    computed_total: row.get(6)?,
                    total_mismatch: row.get(7)?,
                    created_at: row.get(8)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::not_found("請求"),
            _ => AppError::from(e),
        })?;

    claim.receipts = find_receipts(conn, id)?;
    Ok(claim)
}

/// 請求に添付された領収書を登録順に取得する
fn find_receipts(conn: &Connection, claim_id: i64) -> AppResult<Vec<ClaimReceipt>> {
    let mut stmt = conn.prepare(
        "SELECT category, price FROM claim_receipts
         WHERE claim_id = ?1 ORDER BY position ASC",
    )?;

    let receipts = stmt.query_map(params![claim_id], |row| {
        Ok(ClaimReceipt {
            category: row.get(0)?,
            price: row.get(1)?,
        })
    })?;

    receipts
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// 金額不一致の請求件数を取得する
pub fn count_mismatched(conn: &Connection) -> AppResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM claims WHERE total_mismatch = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::create_tables;
    use rusqlite::Connection;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn sample_dto() -> CreateClaimDto {
        CreateClaimDto {
            receipts: vec![
                ClaimReceipt {
                    category: Some("meals".to_string()),
                    price: 80.0,
                },
                ClaimReceipt::default(),
            ],
            allowance_days: 3,
            allowance_rate: 50.0,
            mileage: 20.0,
            mileage_rate: 0.5,
            client_total: 240.0,
            computed_total: 240.0,
        }
    }

    #[test]
    fn test_create_and_find() {
        let conn = create_test_db();

        let claim = create(&conn, sample_dto()).unwrap();
        assert_eq!(claim.allowance_days, 3);
        assert_eq!(claim.computed_total, 240.0);
        assert!(!claim.total_mismatch);
        assert_eq!(claim.receipts.len(), 2);
        assert_eq!(claim.receipts[0].category.as_deref(), Some("meals"));
        assert!(claim.receipts[1].category.is_none());

        let retrieved = find_by_id(&conn, claim.id).unwrap();
        assert_eq!(retrieved, claim);
    }

    #[test]
    fn test_mismatch_is_recorded() {
        let conn = create_test_db();

        let tampered = CreateClaimDto {
            client_total: 1_000.0,
            ..sample_dto()
        };
        let claim = create(&conn, tampered).unwrap();
        assert!(claim.total_mismatch);
        assert_eq!(claim.client_total, 1_000.0);

        create(&conn, sample_dto()).unwrap();
        assert_eq!(count_mismatched(&conn).unwrap(), 1);
    }

    #[test]
    fn test_not_found() {
        let conn = create_test_db();
        let result = find_by_id(&conn, 999);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_negative_price_is_rejected_by_schema() {
        let conn = create_test_db();
        let dto = CreateClaimDto {
            receipts: vec![ClaimReceipt {
                category: Some("meals".to_string()),
                price: -5.0,
            }],
            ..sample_dto()
        };
        assert!(create(&conn, dto).is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM claims", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
