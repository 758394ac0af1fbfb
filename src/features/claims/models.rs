use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 1件の請求に添付できる領収書の最大数
pub const MAX_RECEIPTS: usize = 5;

/// 請求に含まれる領収書1件
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// 領収書カテゴリ（未選択の場合はNone）
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 金額
    #[serde(default)]
    pub price: f64,
}

impl ClaimReceipt {
    /// 合計に算入される金額（カテゴリ未選択・非有限値は0）
    pub fn billable_price(&self) -> f64 {
        match self.category {
            Some(_) if self.price.is_finite() => self.price,
            _ => 0.0,
        }
    }
}

/// POST /api/form のリクエストボディ
///
/// 領収書は添字（"0"〜"4"）をキーとするオブジェクトで送られる
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSubmission {
    #[serde(default)]
    pub receipts: BTreeMap<usize, ClaimReceipt>,
    /// 日当の日数
    pub allowance: u32,
    pub allowance_rate: f64,
    pub mileage: f64,
    pub mileage_rate: f64,
    /// クライアントが計算した合計
    pub sum_of_costs: f64,
}

impl ClaimSubmission {
    /// 添字順の領収書一覧
    pub fn receipt_list(&self) -> Vec<ClaimReceipt> {
        self.receipts.values().cloned().collect()
    }
}

/// 請求受付結果（POST /api/form のレスポンス）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: i64,
    /// サーバーが保存済みの設定で再計算した合計
    pub sum_of_costs: f64,
    /// クライアントが送信した合計
    pub client_sum_of_costs: f64,
    /// 両者が一致しない場合はtrue
    pub total_mismatch: bool,
}

/// 保存済みの請求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredClaim {
    pub id: i64,
    pub receipts: Vec<ClaimReceipt>,
    pub allowance_days: u32,
    pub allowance_rate: f64,
    pub mileage: f64,
    pub mileage_rate: f64,
    pub client_total: f64,
    pub computed_total: f64,
    pub total_mismatch: bool,
    pub created_at: String,
}

/// 請求保存用DTO
#[derive(Debug, Clone)]
pub struct CreateClaimDto {
    pub receipts: Vec<ClaimReceipt>,
    pub allowance_days: u32,
    pub allowance_rate: f64,
    pub mileage: f64,
    pub mileage_rate: f64,
    pub client_total: f64,
    pub computed_total: f64,
}

impl CreateClaimDto {
    /// クライアント合計とサーバー合計が1セント以上ずれているか
    pub fn total_mismatch(&self) -> bool {
        (self.client_total - self.computed_total).abs() >= 0.005
    }
}
