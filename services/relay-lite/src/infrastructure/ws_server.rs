//! HTTP / WebSocketサーバー
//!
//! 本モジュールは以下のエンドポイントを提供する:
//! - リレー情報ドキュメント (GET /)
//! - ヘルスチェック (GET /health)
//! - NIP-01 WebSocket (GET /ws)

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Json, Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use crate::application::{Nip11Handler, RelaySession};
use crate::infrastructure::{
    ChannelWebSocketSender, InMemoryEventRepository, InMemorySubscriptionRepository, PublishGate,
    RelayConfig, RelayInfoConfig,
};

/// サーバー起動・実行時のエラー型
#[derive(Debug, Error)]
pub enum ServerError {
    /// アドレスのバインドに失敗
    #[error("アドレス {address} のバインドに失敗しました: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    /// サーバー実行中のI/Oエラー
    #[error("サーバー実行エラー: {0}")]
    Serve(#[from] std::io::Error),
}

/// アプリケーション状態
///
/// ルーター全体で共有される状態を保持する。クローンは同じストアを指す。
#[derive(Clone)]
pub struct AppState {
    /// 共有イベントストア
    pub event_repo: InMemoryEventRepository,
    /// 全接続のサブスクリプション（接続の到着順）
    pub subscription_repo: InMemorySubscriptionRepository,
    /// 接続ごとの送信チャネル
    pub ws_sender: ChannelWebSocketSender,
    /// 保存・配信とREQ処理の直列化
    pub publish_gate: PublishGate,
    /// リレー情報ドキュメント生成
    pub nip11: Nip11Handler,
    /// 接続ID採番用カウンター
    next_connection: Arc<AtomicU64>,
}

impl AppState {
    /// 設定からアプリケーション状態を作成
    pub fn new(config: &RelayConfig, info: RelayInfoConfig) -> Self {
        Self {
            event_repo: InMemoryEventRepository::with_capacity(config.max_events()),
            subscription_repo: InMemorySubscriptionRepository::new(),
            ws_sender: ChannelWebSocketSender::new(),
            publish_gate: PublishGate::new(),
            nip11: Nip11Handler::new(info),
            next_connection: Arc::new(AtomicU64::new(1)),
        }
    }

    /// 新しい接続IDを払い出す（`conn-1`, `conn-2`, ...）
    pub fn next_connection_id(&self) -> String {
        let n = self.next_connection.fetch_add(1, Ordering::Relaxed);
        format!("conn-{}", n)
    }
}

/// ルーターを構築する
///
/// TraceLayerによりリクエスト/レスポンスの構造化ログを自動記録する。
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(relay_info))
        .route("/health", get(health))
        .route("/ws", get(ws_upgrade))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// リレー情報エンドポイント (GET /)
async fn relay_info(State(state): State<AppState>) -> Response {
    state.nip11.handle()
}

/// ヘルスチェックエンドポイント (GET /health)
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// WebSocketアップグレード (GET /ws)
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// 1つのWebSocket接続を処理する
///
/// 接続中のログは`connection` spanの下に記録される。
pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = state.next_connection_id();
    let span = info_span!("connection", connection_id = %connection_id);
    run_connection(socket, state, connection_id)
        .instrument(span)
        .await;
}

async fn run_connection(socket: WebSocket, state: AppState, connection_id: String) {
    let (mut sink, mut stream) = socket.split();

    let mut outbound = match state.ws_sender.register(&connection_id) {
        Ok(rx) => rx,
        Err(e) => {
            warn!(error = %e, "送信チャネルの登録失敗");
            return;
        }
    };

    // ライタータスク: チャネルに積まれたフレームを順にソケットへ書き出す
    let writer = tokio::spawn(
        async move {
            while let Some(frame) = outbound.recv().await {
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    debug!(error = %e, "ソケット書き込み失敗");
                    break;
                }
            }
            let _ = sink.close().await;
        }
        .instrument(Span::current()),
    );

    let mut session = match RelaySession::open(
        connection_id.as_str(),
        state.event_repo.clone(),
        state.subscription_repo.clone(),
        state.ws_sender.clone(),
        state.publish_gate.clone(),
    )
    .await
    {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "セッション開始失敗");
            let _ = state.ws_sender.unregister(&connection_id);
            writer.abort();
            return;
        }
    };

    info!("接続確立");

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => session.handle_frame(text.as_str()).await,
            Ok(Message::Close(_)) => break,
            // バイナリは無視、ping/pongはaxumが応答する
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "ソケット読み込み失敗");
                break;
            }
        }
    }

    session.disconnect().await;
    if let Err(e) = state.ws_sender.unregister(&connection_id) {
        warn!(error = %e, "送信チャネルの解除失敗");
    }
    // 送信側が破棄されたので、ライターは残りを書き出して終了する
    let _ = writer.await;

    info!("接続終了");
}

/// 指定リスナーでサーバーを実行する
///
/// `shutdown`が完了すると新規接続の受付を停止し、処理中の接続の終了を待つ。
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// 設定に従ってサーバーを起動し、シャットダウンシグナルまで実行する
pub async fn serve(config: RelayConfig, info: RelayInfoConfig) -> Result<(), ServerError> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

    info!(
        address = %address,
        max_events = config.max_events(),
        "リッスン開始"
    );

    let state = AppState::new(&config, info);
    serve_with_listener(listener, state, shutdown_signal()).await?;

    info!("サーバーが正常に停止しました");
    Ok(())
}

/// シャットダウンシグナルを待機する
///
/// SIGTERMまたはCtrl+C (SIGINT) を待機し、いずれかを受信したらリターンする。
/// ハンドラー登録に失敗したシグナルは待機対象から外す。
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C シグナルハンドラーの登録に失敗しました");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM シグナルハンドラーの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    // Windows等の非Unix環境ではSIGTERMは利用不可
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C (SIGINT) を受信しました。graceful shutdownを開始します");
        }
        _ = terminate => {
            info!("SIGTERM を受信しました。graceful shutdownを開始します");
        }
    }
}
