use crate::shared::errors::{AppError, AppResult};
use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// 領収書カテゴリ名 → カテゴリごとの上限額（登録順を保持）
pub type ReceiptCategories = IndexMap<String, f64>;

/// 精算設定（管理画面で編集し、請求フォームが参照する）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// 日当（1日あたり）
    pub allowance_rate: f64,
    /// 自家用車の走行距離単価
    pub mileage_rate: f64,
    /// 請求全体の支給上限
    pub max_reimbursement: f64,
    /// 領収書カテゴリと上限額
    #[serde(
        rename = "receipts",
        default,
        deserialize_with = "deserialize_unique_categories"
    )]
    pub receipt_categories: ReceiptCategories,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            allowance_rate: 0.0,
            mileage_rate: 0.0,
            max_reimbursement: 0.0,
            receipt_categories: ReceiptCategories::new(),
        }
    }
}

impl Metadata {
    /// カテゴリの上限額を取得する（未登録の場合はNone）
    pub fn category_max(&self, name: &str) -> Option<f64> {
        self.receipt_categories.get(name).copied()
    }

    /// 保存前の検証
    ///
    /// レートと上限は有限の非負数、カテゴリ名は空文字列不可
    pub fn validate(&self) -> AppResult<()> {
        validate_amount("日当", self.allowance_rate)?;
        validate_amount("走行距離単価", self.mileage_rate)?;
        validate_amount("支給上限", self.max_reimbursement)?;

        for (name, max_price) in &self.receipt_categories {
            if name.trim().is_empty() {
                return Err(AppError::validation("領収書カテゴリ名を入力してください"));
            }
            validate_amount(&format!("カテゴリ「{name}」の上限額"), *max_price)?;
        }

        Ok(())
    }
}

/// カテゴリ名の重複したオブジェクトを拒否する（IndexMap標準の後勝ちにしない）
fn deserialize_unique_categories<'de, D>(deserializer: D) -> Result<ReceiptCategories, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueCategoriesVisitor;

    impl<'de> de::Visitor<'de> for UniqueCategoriesVisitor {
        type Value = ReceiptCategories;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of unique receipt category names to max prices")
        }

        fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut categories = ReceiptCategories::with_capacity(map.size_hint().unwrap_or(0));

            while let Some((name, max_price)) = map.next_entry::<String, f64>()? {
                if categories.contains_key(&name) {
                    return Err(de::Error::custom(format!(
                        "領収書カテゴリ名が重複しています: {name}"
                    )));
                }
                categories.insert(name, max_price);
            }

            Ok(categories)
        }
    }

    deserializer.deserialize_map(UniqueCategoriesVisitor)
}

/// 金額が有限の非負数であることを確認する
pub fn validate_amount(label: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::validation(format!("{label}が数値ではありません")));
    }
    if value < 0.0 {
        return Err(AppError::validation(format!(
            "{label}は0以上である必要があります"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_metadata_wire_format() {
        let json = serde_json::to_string(&sample_metadata()).unwrap();
        assert!(json.contains("\"allowanceRate\":50.0"));
        assert!(json.contains("\"mileageRate\":0.5"));
        assert!(json.contains("\"maxReimbursement\":500.0"));
        assert!(json.contains("\"receipts\":{\"meals\":100.0,\"hotel\":250.0}"));
    }

    #[test]
    fn test_metadata_deserialization_keeps_category_order() {
        let json = r#"{
            "allowanceRate": 40,
            "mileageRate": 0.3,
            "maxReimbursement": 300,
            "receipts": {"taxi": 30, "meals": 80, "hotel": 120}
        }"#;

        let metadata: Metadata = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = metadata
            .receipt_categories
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["taxi", "meals", "hotel"]);
        assert_eq!(metadata.category_max("meals"), Some(80.0));
        assert_eq!(metadata.category_max("unknown"), None);
    }

    #[test]
    fn test_duplicate_category_names_are_rejected() {
        let json = r#"{
            "allowanceRate": 40,
            "mileageRate": 0.3,
            "maxReimbursement": 300,
            "receipts": {"meals": 80, "taxi": 30, "meals": 10}
        }"#;

        let error = serde_json::from_str::<Metadata>(json).unwrap_err();
        assert!(error.to_string().contains("meals"));
    }

    #[test]
    fn test_metadata_without_receipts_field() {
        let json = r#"{"allowanceRate": 1, "mileageRate": 2, "maxReimbursement": 3}"#;
        let metadata: Metadata = serde_json::from_str(json).unwrap();
        assert!(metadata.receipt_categories.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(sample_metadata().validate().is_ok());
        assert!(Metadata::default().validate().is_ok());

        let negative = Metadata {
            mileage_rate: -0.1,
            ..sample_metadata()
        };
        assert!(matches!(negative.validate(), Err(AppError::Validation(_))));

        let not_finite = Metadata {
            max_reimbursement: f64::INFINITY,
            ..sample_metadata()
        };
        assert!(not_finite.validate().is_err());

        let mut empty_name = sample_metadata();
        empty_name.receipt_categories.insert(String::new(), 0.0);
        assert!(empty_name.validate().is_err());
    }
}
