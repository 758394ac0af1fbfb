use crate::features::claims::calculator;
use crate::features::claims::models::{ClaimReceipt, ClaimSubmission, MAX_RECEIPTS};
use crate::features::metadata::models::Metadata;
use chrono::NaiveDate;

/// 請求フォームの入力状態
///
/// 合計額は保持せず、入力と精算設定から毎回計算する
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClaimForm {
    trip_start: Option<NaiveDate>,
    trip_end: Option<NaiveDate>,
    allowance_days: u32,
    mileage: f64,
    receipts: Vec<ClaimReceipt>,
}

impl ClaimForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowance_days(&self) -> u32 {
        self.allowance_days
    }

    pub fn mileage(&self) -> f64 {
        self.mileage
    }

    pub fn receipts(&self) -> &[ClaimReceipt] {
        &self.receipts
    }

    pub fn trip_period(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (self.trip_start, self.trip_end)
    }

    pub fn can_add_receipt(&self) -> bool {
        self.receipts.len() < MAX_RECEIPTS
    }

    pub fn can_remove_receipt(&self) -> bool {
        !self.receipts.is_empty()
    }

    /// 出張期間を設定し、日当の日数を再計算する
    pub fn set_trip_period(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.trip_start = start;
        self.trip_end = end;
        self.allowance_days = calculator::allowance_days(start, end);
    }

    /// 走行距離を設定する（未入力・負数・非有限値は0）
    pub fn set_mileage(&mut self, value: Option<f64>) {
        self.mileage = value.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0);
    }

    /// 空の領収書を追加する（上限5件）
    pub fn add_receipt(&mut self) {
        if self.can_add_receipt() {
            self.receipts.push(ClaimReceipt::default());
        }
    }

    /// 最後の領収書を削除する
    pub fn remove_receipt(&mut self) {
        self.receipts.pop();
    }

    /// 領収書のカテゴリを変更する（金額は0に戻る）
    pub fn change_receipt_type(&mut self, index: usize, value: Option<&str>) {
        let Some(category) = value else {
            return;
        };
        if let Some(receipt) = self.receipts.get_mut(index) {
            receipt.category = Some(category.to_string());
            receipt.price = 0.0;
        }
    }

    /// 領収書の金額を変更する
    ///
    /// カテゴリ未選択の領収書、0・未入力・負数は変更なし
    pub fn change_receipt_price(&mut self, index: usize, value: Option<f64>) {
        let price = match value {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => return,
        };
        if let Some(receipt) = self.receipts.get_mut(index) {
            if receipt.category.is_some() {
                receipt.price = price;
            }
        }
    }

    /// 現在の入力での合計額
    pub fn total_cost(&self, metadata: &Metadata) -> f64 {
        calculator::compute_total(
            metadata,
            self.allowance_days,
            self.mileage,
            &self.receipts,
        )
    }

    /// 入力欄に表示する金額（0は未入力として扱う）
    pub fn receipt_price(&self, index: usize) -> Option<f64> {
        self.receipts
            .get(index)
            .map(|receipt| receipt.price)
            .filter(|price| *price != 0.0)
    }

    /// 金額入力欄のプレースホルダー
    pub fn price_placeholder(&self, index: usize, metadata: &Metadata) -> String {
        let category = self
            .receipts
            .get(index)
            .and_then(|receipt| receipt.category.as_deref());
        calculator::price_placeholder(metadata, category)
    }

    /// 金額入力欄の上限（表示用。カテゴリ未選択は0）
    pub fn max_for_type(&self, index: usize, metadata: &Metadata) -> f64 {
        let category = self
            .receipts
            .get(index)
            .and_then(|receipt| receipt.category.as_deref());
        calculator::category_max(metadata, category).unwrap_or(0.0)
    }

    /// 送信用のペイロードを作成する
    pub fn submission(&self, metadata: &Metadata) -> ClaimSubmission {
        ClaimSubmission {
            receipts: self.receipts.iter().cloned().enumerate().collect(),
            allowance: self.allowance_days,
            allowance_rate: metadata.allowance_rate,
            mileage: self.mileage,
            mileage_rate: metadata.mileage_rate,
            sum_of_costs: self.total_cost(metadata),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::metadata::models::ReceiptCategories;

    fn sample_metadata() -> Metadata {
        let mut receipt_categories = ReceiptCategories::new();
        receipt_categories.insert("meals".to_string(), 100.0);
        receipt_categories.insert("hotel".to_string(), 250.0);
        Metadata {
            allowance_rate: 50.0,
            mileage_rate: 0.5,
            max_reimbursement: 500.0,
            receipt_categories,
        }
    }

    #[test]
    fn test_receipt_limit() {
        let mut form = ClaimForm::new();
        for _ in 0..MAX_RECEIPTS {
            form.add_receipt();
        }
        assert!(!form.can_add_receipt());

        form.add_receipt();
        assert_eq!(form.receipts().len(), MAX_RECEIPTS);
    }

    #[test]
    fn test_remove_receipt_drops_the_last_one() {
        let mut form = ClaimForm::new();
        assert!(!form.can_remove_receipt());
        form.remove_receipt();
        assert!(form.receipts().is_empty());

        form.add_receipt();
        form.add_receipt();
        form.change_receipt_type(0, Some("meals"));
        form.remove_receipt();

        assert_eq!(form.receipts().len(), 1);
        assert_eq!(form.receipts()[0].category.as_deref(), Some("meals"));
    }

    #[test]
    fn test_price_requires_category() {
        let mut form = ClaimForm::new();
        form.add_receipt();
        form.change_receipt_price(0, Some(40.0));
        assert_eq!(form.receipts()[0].price, 0.0);

        form.change_receipt_type(0, Some("meals"));
        form.change_receipt_price(0, Some(40.0));
        assert_eq!(form.receipts()[0].price, 40.0);
    }

    #[test]
    fn test_changing_type_resets_price() {
        let mut form = ClaimForm::new();
        form.add_receipt();
        form.change_receipt_type(0, Some("meals"));
        form.change_receipt_price(0, Some(40.0));

        form.change_receipt_type(0, Some("hotel"));
        assert_eq!(form.receipts()[0].price, 0.0);

        form.change_receipt_type(0, None);
        assert_eq!(form.receipts()[0].category.as_deref(), Some("hotel"));
    }

    #[test]
    fn test_zero_price_is_no_change() {
        let mut form = ClaimForm::new();
        form.add_receipt();
        form.change_receipt_type(0, Some("meals"));
        form.change_receipt_price(0, Some(40.0));
        form.change_receipt_price(0, Some(0.0));
        form.change_receipt_price(0, None);
        assert_eq!(form.receipts()[0].price, 40.0);
        assert_eq!(form.receipt_price(0), Some(40.0));
    }

    #[test]
    fn test_total_follows_every_change() {
        let metadata = sample_metadata();
        let mut form = ClaimForm::new();
        assert_eq!(form.total_cost(&metadata), 0.0);

        form.set_trip_period(
            NaiveDate::from_ymd_opt(2024, 5, 1),
            NaiveDate::from_ymd_opt(2024, 5, 3),
        );
        assert_eq!(form.allowance_days(), 3);
        assert_eq!(form.total_cost(&metadata), 150.0);

        form.set_mileage(Some(20.0));
        assert_eq!(form.total_cost(&metadata), 160.0);

        form.add_receipt();
        form.change_receipt_type(0, Some("meals"));
        form.change_receipt_price(0, Some(80.0));
        assert_eq!(form.total_cost(&metadata), 240.0);

        form.set_trip_period(
            NaiveDate::from_ymd_opt(2024, 5, 1),
            NaiveDate::from_ymd_opt(2024, 5, 10),
        );
        assert_eq!(form.total_cost(&metadata), 500.0);

        form.set_trip_period(None, NaiveDate::from_ymd_opt(2024, 5, 10));
        assert_eq!(form.allowance_days(), 0);
        assert_eq!(form.trip_period(), (None, NaiveDate::from_ymd_opt(2024, 5, 10)));
    }

    #[test]
    fn test_missing_mileage_resets_to_zero() {
        let mut form = ClaimForm::new();
        form.set_mileage(Some(12.0));
        form.set_mileage(None);
        assert_eq!(form.mileage(), 0.0);
    }

    #[test]
    fn test_placeholder_and_max_for_type() {
        let metadata = sample_metadata();
        let mut form = ClaimForm::new();
        form.add_receipt();
        assert_eq!(form.price_placeholder(0, &metadata), "Price");
        assert_eq!(form.max_for_type(0, &metadata), 0.0);

        form.change_receipt_type(0, Some("hotel"));
        assert_eq!(form.price_placeholder(0, &metadata), "Max: 250");
        assert_eq!(form.max_for_type(0, &metadata), 250.0);
        assert_eq!(form.max_for_type(3, &metadata), 0.0);
    }

    #[test]
    fn test_submission_payload() {
        let metadata = sample_metadata();
        let mut form = ClaimForm::new();
        form.set_trip_period(
            NaiveDate::from_ymd_opt(2024, 5, 1),
            NaiveDate::from_ymd_opt(2024, 5, 3),
        );
        form.set_mileage(Some(20.0));
        form.add_receipt();
        form.change_receipt_type(0, Some("meals"));
        form.change_receipt_price(0, Some(80.0));
        form.add_receipt();

        let submission = form.submission(&metadata);
        assert_eq!(submission.allowance, 3);
        assert_eq!(submission.allowance_rate, 50.0);
        assert_eq!(submission.mileage_rate, 0.5);
        assert_eq!(submission.sum_of_costs, 240.0);
        assert_eq!(submission.receipts.len(), 2);
        assert!(submission.receipts[&1].category.is_none());
    }
}
