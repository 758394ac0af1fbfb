use crate::features::claims::calculator;
use crate::features::claims::models::{
    ClaimSubmission, CreateClaimDto, SubmissionReceipt, MAX_RECEIPTS,
};
use crate::features::claims::repository;
use crate::features::metadata::models::validate_amount;
use crate::features::metadata::repository as metadata_repository;
use crate::shared::errors::{AppError, AppResult};
use crate::AppState;
use log::{info, warn};

/// 請求を受け付ける（POST /api/form）
///
/// 合計はクライアントの値を信用せず、保存済みの精算設定で再計算する。
/// 両者が一致しない場合も受け付けるが、不一致として記録する。
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `submission` - フォームから送信された請求
///
/// # 戻り値
/// 受付結果（サーバー計算の合計と不一致フラグ）
pub fn submit_claim(state: &AppState, submission: ClaimSubmission) -> AppResult<SubmissionReceipt> {
    validate_submission(&submission)?;

    let db = state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロック取得失敗: {e}")))?;

    let metadata = metadata_repository::load(&db)?;
    let receipts = submission.receipt_list();
    let computed_total = calculator::compute_total(
        &metadata,
        submission.allowance,
        submission.mileage,
        &receipts,
    );

    let dto = CreateClaimDto {
        receipts,
        allowance_days: submission.allowance,
        allowance_rate: metadata.allowance_rate,
        mileage: submission.mileage,
        mileage_rate: metadata.mileage_rate,
        client_total: submission.sum_of_costs,
        computed_total,
    };

    if dto.total_mismatch() {
        warn!(
            "請求金額が一致しません: client={}, computed={}",
            dto.client_total, dto.computed_total
        );
    }
    if submission.allowance_rate != metadata.allowance_rate
        || submission.mileage_rate != metadata.mileage_rate
    {
        warn!(
            "送信された単価が保存済みの設定と異なります: allowanceRate={}, mileageRate={}",
            submission.allowance_rate, submission.mileage_rate
        );
    }

    let claim = repository::create(&db, dto)?;

    info!(
        "請求を受け付けました: id={}, total={}, mismatch={}",
        claim.id, claim.computed_total, claim.total_mismatch
    );

    Ok(SubmissionReceipt {
        id: claim.id,
        sum_of_costs: claim.computed_total,
        client_sum_of_costs: claim.client_total,
        total_mismatch: claim.total_mismatch,
    })
}

/// 送信内容のバリデーション
fn validate_submission(submission: &ClaimSubmission) -> AppResult<()> {
    if submission.receipts.len() > MAX_RECEIPTS {
        return Err(AppError::validation(format!(
            "領収書は最大{MAX_RECEIPTS}件までです"
        )));
    }

    for (index, receipt) in &submission.receipts {
        if *index >= MAX_RECEIPTS {
            return Err(AppError::validation(format!(
                "領収書の添字が不正です: {index}"
            )));
        }

        validate_amount("領収書の金額", receipt.price)?;

        let has_category = receipt
            .category
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty());
        if receipt.price > 0.0 && !has_category {
            return Err(AppError::validation(
                "金額のある領収書にはカテゴリが必要です",
            ));
        }
    }

    validate_amount("走行距離", submission.mileage)?;
    validate_amount("日当", submission.allowance_rate)?;
    validate_amount("走行距離単価", submission.mileage_rate)?;

    if !submission.sum_of_costs.is_finite() {
        return Err(AppError::validation("合計金額が不正です"));
    }

    Ok(())
}
