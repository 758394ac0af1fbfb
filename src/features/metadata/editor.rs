//! 管理画面の編集ルール
//!
//! 各操作は編集状態を受け取り、更新後の状態を返す。無効な操作はエラーにせず
//! 何もしない（元の状態をそのまま返す）。

use crate::features::metadata::models::{Metadata, ReceiptCategories};

/// 名前がまだ決まっていない新規カテゴリ（同時に1件まで）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DraftCategory {
    pub max_price: f64,
}

/// 下書きを指す名前。下書きは保存対象のマップには含まれない
pub const DRAFT_NAME: &str = "";

/// 精算設定の編集状態
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataEditor {
    metadata: Metadata,
    draft: Option<DraftCategory>,
}

/// 空白のみの名前は未入力と同じ（保存時のバリデーションと同じ基準）
fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

/// 0・未入力・NaN は「変更なし」として扱う
fn truthy(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

impl MetadataEditor {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            draft: None,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// 保存用のスナップショット（下書きは含まない）
    pub fn into_metadata(self) -> Metadata {
        self.metadata
    }

    pub fn categories(&self) -> &ReceiptCategories {
        &self.metadata.receipt_categories
    }

    pub fn draft(&self) -> Option<DraftCategory> {
        self.draft
    }

    /// 新しいカテゴリを追加できるか（下書きの命名が済んでいない間は不可）
    pub fn can_add_category(&self) -> bool {
        self.draft.is_none()
    }

    /// 上限0の下書きを追加する
    pub fn add_category(mut self) -> Self {
        if self.draft.is_none() {
            self.draft = Some(DraftCategory::default());
        }
        self
    }

    /// カテゴリ名を変更する
    ///
    /// `new_name` が未指定・既存キーの場合は何もしない。
    /// 下書き（`old_name == ""`）の命名はマップ末尾への確定になる。
    /// 名前を空（空白のみを含む）にしたカテゴリは下書きに戻る。下書きが既にある場合は何もしない。
    pub fn rename_category(mut self, old_name: &str, new_name: Option<&str>) -> Self {
        let Some(new_name) = new_name else {
            return self;
        };

        if is_blank(new_name) {
            if old_name != DRAFT_NAME && self.draft.is_none() {
                if let Some(max_price) = self.metadata.receipt_categories.shift_remove(old_name) {
                    self.draft = Some(DraftCategory { max_price });
                }
            }
            return self;
        }

        if self.metadata.receipt_categories.contains_key(new_name) {
            return self;
        }

        if old_name == DRAFT_NAME {
            if let Some(draft) = self.draft.take() {
                self.metadata
                    .receipt_categories
                    .insert(new_name.to_string(), draft.max_price);
            }
            return self;
        }

        if !self.metadata.receipt_categories.contains_key(old_name) {
            return self;
        }

        // 位置を保ったままキーだけを差し替える
        self.metadata.receipt_categories = std::mem::take(&mut self.metadata.receipt_categories)
            .into_iter()
            .map(|(name, max_price)| {
                if name == old_name {
                    (new_name.to_string(), max_price)
                } else {
                    (name, max_price)
                }
            })
            .collect();
        self
    }

    /// カテゴリの上限額を設定する（0・未入力は変更なし）
    pub fn set_category_max(mut self, name: &str, value: Option<f64>) -> Self {
        let value = match truthy(value) {
            Some(v) if v > 0.0 && v.is_finite() => v,
            _ => return self,
        };

        if name == DRAFT_NAME {
            if let Some(draft) = self.draft.as_mut() {
                draft.max_price = value;
            }
        } else if let Some(max_price) = self.metadata.receipt_categories.get_mut(name) {
            *max_price = value;
        }
        self
    }

    /// カテゴリを削除する（`""` は下書きの破棄）
    pub fn remove_category(mut self, name: &str) -> Self {
        if name == DRAFT_NAME {
            self.draft = None;
        } else {
            self.metadata.receipt_categories.shift_remove(name);
        }
        self
    }

    pub fn set_allowance_rate(mut self, value: Option<f64>) -> Self {
        if let Some(v) = truthy(value) {
            self.metadata.allowance_rate = v;
        }
        self
    }

    pub fn set_mileage_rate(mut self, value: Option<f64>) -> Self {
        if let Some(v) = truthy(value) {
            self.metadata.mileage_rate = v;
        }
        self
    }

    pub fn set_max_reimbursement(mut self, value: Option<f64>) -> Self {
        if let Some(v) = truthy(value) {
            self.metadata.max_reimbursement = v;
        }
        self
    }
}
