/// 精算APIサーバー
///
/// - GET/POST /api/metadata: 精算設定の取得・保存
/// - POST /api/form: 請求の受付
pub mod response;
pub mod router;


use crate::shared::errors::AppResult;
use crate::AppState;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// HTTP/1 APIサーバー
pub struct ApiServer {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl ApiServer {
    /// 指定アドレスで待ち受けを開始する
    ///
    /// # 引数
    /// * `addr` - 待ち受けアドレス（ポート0で自動割り当て）
    /// * `state` - アプリケーション状態
    pub async fn bind(addr: SocketAddr, state: Arc<AppState>) -> AppResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, state })
    }

    /// 実際に待ち受けているアドレス
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// `shutdown` が完了するまでリクエストを処理する
    pub async fn run<F>(self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        log::info!("APIサーバーを開始しました: http://{addr}");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("APIサーバーを停止します");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        log::debug!("接続を受け付けました: {peer}");
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            handle_connection(stream, state).await;
                        });
                    }
                    Err(e) => {
                        // 一時的なエラー（ファイルディスクリプタ不足など）では停止しない
                        log::error!("接続受け入れエラー: {e}");
                    }
                },
            }
        }

        Ok(())
    }
}

/// TCP接続を処理する
async fn handle_connection(stream: TcpStream, state: Arc<AppState>) {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req| router::handle_request(req, Arc::clone(&state)));

    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
        log::error!("HTTP接続処理エラー: {err}");
    }
}
