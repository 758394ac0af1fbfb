/// 出張費請求機能モジュール
///
/// - 合計額の計算（日当・走行距離・領収書、支給上限で頭打ち）
/// - 請求フォームの入力ルール
/// - 請求の受付とSQLiteへの保存
/// - APIサーバー経由の送信とフォームセッション
pub mod api_commands;
pub mod calculator;
pub mod commands;
pub mod form;
pub mod models;
pub mod repository;
pub mod session;

pub use form::ClaimForm;
pub use models::{ClaimReceipt, ClaimSubmission, SubmissionReceipt, MAX_RECEIPTS};
pub use session::ClaimFormSession;
