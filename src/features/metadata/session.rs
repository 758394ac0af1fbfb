use crate::features::metadata::{api_commands, editor::MetadataEditor, models::Metadata};
use crate::shared::api_client::ApiClient;
use crate::shared::errors::AppResult;
use log::error;

/// 管理画面1回分の編集状態
///
/// 通信結果は呼び出し側に返す。失敗時も編集中の状態はそのまま残る
#[derive(Debug, Default)]
pub struct AdminSession {
    editor: MetadataEditor,
}

impl AdminSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editor(&self) -> &MetadataEditor {
        &self.editor
    }

    /// 編集操作を適用する
    ///
    /// # 使用例
    /// `session.edit(|editor| editor.add_category())`
    pub fn edit<F>(&mut self, operation: F)
    where
        F: FnOnce(MetadataEditor) -> MetadataEditor,
    {
        let current = std::mem::take(&mut self.editor);
        self.editor = operation(current);
    }

    /// サーバーから精算設定を読み込む（編集中の下書きは破棄される）
    pub async fn load_metadata(&mut self, api_client: &ApiClient) -> AppResult<()> {
        match api_commands::fetch_metadata(api_client).await {
            Ok(metadata) => {
                self.editor = MetadataEditor::new(metadata);
                Ok(())
            }
            Err(e) => {
                error!("精算設定の読み込みに失敗しました: {e}");
                Err(e)
            }
        }
    }

    /// 現在の設定を保存する（下書きは保存されない）
    pub async fn save_metadata(&self, api_client: &ApiClient) -> AppResult<Metadata> {
        api_commands::save_metadata(api_client, self.editor.metadata())
            .await
            .map_err(|e| {
                error!("精算設定の保存に失敗しました: {e}");
                e
            })
    }
}
