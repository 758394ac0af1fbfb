//! 精算額の計算
//!
//! 合計 = min(支給上限, 領収書合計 + 日数 × 日当 + 距離 × 単価)
//! 丸めは最後に1回だけ行う（小数第2位）。

use crate::features::claims::models::ClaimReceipt;
use crate::features::metadata::models::Metadata;
use chrono::NaiveDate;

/// 請求の合計額を計算する
///
/// # 引数
/// * `metadata` - 精算設定
/// * `allowance_days` - 日当の日数
/// * `mileage` - 走行距離
/// * `receipts` - 領収書（カテゴリ未選択のものは0として扱う）
///
/// # 戻り値
/// 支給上限で頭打ちにし、小数第2位に丸めた合計
pub fn compute_total(
    metadata: &Metadata,
    allowance_days: u32,
    mileage: f64,
    receipts: &[ClaimReceipt],
) -> f64 {
    let sum_of_receipts: f64 = receipts.iter().map(ClaimReceipt::billable_price).sum();
    let allowance_cost = f64::from(allowance_days) * metadata.allowance_rate;
    let mileage_cost = mileage * metadata.mileage_rate;

    let sum_of_costs = sum_of_receipts + allowance_cost + mileage_cost;
    round_to_cents(sum_of_costs.min(metadata.max_reimbursement))
}

/// 小数第2位に丸める（`value * 100` を四捨五入して100で割る）
///
/// 2進浮動小数点のため、1.005 のように100倍した値が 100.4999… になる金額は
/// 切り捨て側に丸まる（1.005 → 1.0）。ブラウザの `Math.round(x * 100) / 100` と同じ結果になる。
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 出張期間から日当の日数を求める（開始日・終了日を含む）
///
/// どちらかが未選択の場合、または終了日が開始日より前の場合は0
pub fn allowance_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> u32 {
    match (start, end) {
        (Some(start), Some(end)) => {
            let days = (end - start).num_days();
            if days < 0 {
                0
            } else {
                u32::try_from(days + 1).unwrap_or(u32::MAX)
            }
        }
        _ => 0,
    }
}

/// カテゴリの上限額を取得する（表示用。計算では使用しない）
pub fn category_max(metadata: &Metadata, category: Option<&str>) -> Option<f64> {
    category.and_then(|name| metadata.category_max(name))
}

/// 金額入力欄のプレースホルダー
pub fn price_placeholder(metadata: &Metadata, category: Option<&str>) -> String {
    match category_max(metadata, category) {
        Some(max_price) => format!("Max: {max_price}"),
        None => "Price".to_string(),
    }
}
