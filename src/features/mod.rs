/// 機能別モジュール
///
/// 各機能モジュールは、その機能に関連するコード（モデル、コマンド、データベース操作、
/// API通信、セッション）を含む自己完結型のユニットです。
pub mod claims;
pub mod metadata;
pub mod server;
