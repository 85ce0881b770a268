/// リレーセッション
///
/// 1つのWebSocket接続に対応するプロトコル状態機械。
/// 受信フレームをパースし、EVENT / REQ / CLOSE をそれぞれのハンドラーに委譲する。
use tracing::{debug, trace, warn};

use crate::application::{
    ClientMessage, ConnectHandler, ConnectHandlerError, DisconnectHandler, EventHandler,
    MessageParser, SubscriptionHandler,
};
use crate::infrastructure::{EventRepository, PublishGate, SubscriptionRepository, WebSocketSender};

/// セッションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// フレーム処理中（初期状態）
    Open,
    /// 切断済み（終端状態、以後のフレームは無視）
    Closed,
}

/// 接続ごとのセッション
///
/// 同一接続のフレームは`&mut self`で逐次処理される。
/// 接続間で共有されるのはリポジトリ、送信チャネル、ゲートのみ。
pub struct RelaySession<ER, SR, WS>
where
    ER: EventRepository,
    SR: SubscriptionRepository,
    WS: WebSocketSender,
{
    /// 接続ID
    connection_id: String,
    /// セッション状態
    state: SessionState,
    /// イベントハンドラー
    event_handler: EventHandler<ER, SR, WS>,
    /// サブスクリプションハンドラー
    subscription_handler: SubscriptionHandler<ER, SR, WS>,
    /// 切断ハンドラー
    disconnect_handler: DisconnectHandler<SR>,
    /// WebSocket送信
    ws_sender: WS,
}

impl<ER, SR, WS> RelaySession<ER, SR, WS>
where
    ER: EventRepository + Clone,
    SR: SubscriptionRepository + Clone,
    WS: WebSocketSender + Clone,
{
    /// 接続を登録してセッションを開始
    ///
    /// 接続はこの時点でブロードキャスト順の末尾に並ぶ。
    /// `gate`はリレー内の全セッションで同じものを渡す。
    pub async fn open(
        connection_id: impl Into<String>,
        event_repo: ER,
        subscription_repo: SR,
        ws_sender: WS,
        gate: PublishGate,
    ) -> Result<Self, ConnectHandlerError> {
        let connection_id = connection_id.into();

        ConnectHandler::new(subscription_repo.clone())
            .handle(&connection_id)
            .await?;

        let event_handler = EventHandler::new(
            event_repo.clone(),
            subscription_repo.clone(),
            ws_sender.clone(),
            gate.clone(),
        );
        let subscription_handler = SubscriptionHandler::new(
            event_repo,
            subscription_repo.clone(),
            ws_sender.clone(),
            gate,
        );
        let disconnect_handler = DisconnectHandler::new(subscription_repo);

        debug!(connection_id = %connection_id, "セッション開始");

        Ok(Self {
            connection_id,
            state: SessionState::Open,
            event_handler,
            subscription_handler,
            disconnect_handler,
            ws_sender,
        })
    }
}

impl<ER, SR, WS> RelaySession<ER, SR, WS>
where
    ER: EventRepository,
    SR: SubscriptionRepository,
    WS: WebSocketSender,
{
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// 受信テキストフレームを処理
    ///
    /// # 処理フロー
    /// 1. フレームをパース（失敗時はNOTICEを送信してOpenのまま継続）
    /// 2. メッセージタイプに応じてハンドラーに委譲
    /// 3. EVENTの場合は配信完了後にOK応答を送信
    pub async fn handle_frame(&mut self, frame: &str) {
        if self.state == SessionState::Closed {
            trace!(connection_id = %self.connection_id, "切断済みセッションのフレームを無視");
            return;
        }

        let client_message = match MessageParser::parse(frame) {
            Ok(msg) => msg,
            Err(err) => {
                debug!(
                    connection_id = %self.connection_id,
                    error = %err,
                    "不正なフレーム"
                );
                self.send(&err.to_notice().to_json()).await;
                return;
            }
        };

        match client_message {
            ClientMessage::Event(event_json) => {
                let response = self
                    .event_handler
                    .handle(event_json, &self.connection_id)
                    .await;
                self.send(&response.to_json()).await;
            }
            ClientMessage::Req {
                subscription_id,
                filter,
            } => {
                // EVENT/EOSE/NOTICEはハンドラー内で送信済み
                let _ = self
                    .subscription_handler
                    .handle_req(&subscription_id, &filter, &self.connection_id)
                    .await;
            }
            ClientMessage::Close { subscription_id } => {
                let _ = self
                    .subscription_handler
                    .handle_close(&subscription_id, &self.connection_id)
                    .await;
            }
        }
    }

    /// 切断を処理
    ///
    /// Closedに遷移し、この接続の全サブスクリプションを破棄する。
    /// 2回目以降の呼び出しは何もしない。
    pub async fn disconnect(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;

        if let Err(e) = self.disconnect_handler.handle(&self.connection_id).await {
            warn!(
                connection_id = %self.connection_id,
                error = %e,
                "切断処理失敗"
            );
        }
    }

    async fn send(&self, message: &str) {
        if let Err(e) = self.ws_sender.send(&self.connection_id, message).await {
            debug!(
                connection_id = %self.connection_id,
                error = %e,
                "応答送信失敗"
            );
        }
    }
}
