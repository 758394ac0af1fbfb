/// 精算設定機能モジュール
///
/// このモジュールは精算設定（日当・走行距離単価・支給上限・領収書カテゴリ）に
/// 関連するすべての機能を提供します：
/// - 設定モデルとバリデーション
/// - 管理画面の編集ルール（カテゴリの追加・名前変更・上限設定・削除）
/// - SQLiteへの保存と読み込み
/// - APIサーバー経由の取得・保存と管理画面セッション
pub mod api_commands;
pub mod commands;
pub mod editor;
pub mod models;
pub mod repository;
pub mod session;

pub use editor::{DraftCategory, MetadataEditor, DRAFT_NAME};
pub use models::{Metadata, ReceiptCategories};
pub use session::AdminSession;
