/// サブスクリプションハンドラー
///
/// REQ/CLOSEメッセージ処理を実行する
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::domain::{Filter, RelayMessage};
use crate::infrastructure::{
    EventRepository, EventRepositoryError, PublishGate, SubscriptionRepository,
    SubscriptionRepositoryError, WebSocketSender,
};

/// サブスクリプションハンドラーのエラー型
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubscriptionHandlerError {
    /// リポジトリエラー
    #[error("repository error: {0}")]
    RepositoryError(String),
}

impl From<SubscriptionRepositoryError> for SubscriptionHandlerError {
    fn from(err: SubscriptionRepositoryError) -> Self {
        SubscriptionHandlerError::RepositoryError(err.to_string())
    }
}

impl From<EventRepositoryError> for SubscriptionHandlerError {
    fn from(err: EventRepositoryError) -> Self {
        SubscriptionHandlerError::RepositoryError(err.to_string())
    }
}

/// リポジトリ障害時にクライアントへ返すNOTICE
const SUBSCRIPTION_ERROR_NOTICE: &str = "error: failed to manage subscription";

/// REQ/CLOSEメッセージを処理するハンドラー
///
/// サブスクリプションの作成、バックログ送信、削除を行う
pub struct SubscriptionHandler<ER, SR, WS>
where
    ER: EventRepository,
    SR: SubscriptionRepository,
    WS: WebSocketSender,
{
    /// イベントリポジトリ
    event_repo: ER,
    /// サブスクリプションリポジトリ
    subscription_repo: SR,
    /// WebSocket送信
    ws_sender: WS,
    /// EVENTの保存・配信との直列化
    gate: PublishGate,
}

impl<ER, SR, WS> SubscriptionHandler<ER, SR, WS>
where
    ER: EventRepository,
    SR: SubscriptionRepository,
    WS: WebSocketSender,
{
    /// 新しいSubscriptionHandlerを作成
    pub fn new(event_repo: ER, subscription_repo: SR, ws_sender: WS, gate: PublishGate) -> Self {
        Self {
            event_repo,
            subscription_repo,
            ws_sender,
            gate,
        }
    }

    /// REQメッセージを処理
    ///
    /// # 処理フロー
    /// 1. フィルターに合致する保存済みイベントをクエリ
    /// 2. サブスクリプションを作成/上書き
    /// 3. 取得したイベントをEVENT応答として順に送信
    /// 4. EOSE応答を送信
    ///
    /// 1〜4はゲート内で行うため、並行して届いたイベントは
    /// バックログかEOSE後のライブ配信のどちらか一方でのみ届く。
    ///
    /// # 戻り値
    /// エラー時はNOTICEをクライアントに送信済み（サブスクリプションは登録されない）
    pub async fn handle_req(
        &self,
        subscription_id: &str,
        filter: &Filter,
        connection_id: &str,
    ) -> Result<(), SubscriptionHandlerError> {
        let _gate = self.gate.enter().await;

        let events = match self.event_repo.query(filter).await {
            Ok(events) => events,
            Err(e) => {
                warn!(
                    connection_id = connection_id,
                    subscription_id = subscription_id,
                    error = %e,
                    "バックログのクエリ失敗"
                );
                self.send_notice(connection_id).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self
            .subscription_repo
            .upsert(connection_id, subscription_id, filter)
            .await
        {
            warn!(
                connection_id = connection_id,
                subscription_id = subscription_id,
                error = %e,
                "サブスクリプション登録失敗"
            );
            self.send_notice(connection_id).await;
            return Err(e.into());
        }

        debug!(
            connection_id = connection_id,
            subscription_id = subscription_id,
            backlog_count = events.len(),
            "サブスクリプション作成、バックログ送信"
        );

        for event in events {
            let event_msg = RelayMessage::event(subscription_id, event);
            // 送信エラーは無視（切断は接続終了処理で対応）
            let _ = self.ws_sender.send(connection_id, &event_msg.to_json()).await;
        }

        let eose_msg = RelayMessage::eose(subscription_id);
        let _ = self.ws_sender.send(connection_id, &eose_msg.to_json()).await;

        Ok(())
    }

    /// CLOSEメッセージを処理
    ///
    /// 存在しないサブスクリプションの場合も成功（応答なし）。
    pub async fn handle_close(
        &self,
        subscription_id: &str,
        connection_id: &str,
    ) -> Result<(), SubscriptionHandlerError> {
        match self
            .subscription_repo
            .delete(connection_id, subscription_id)
            .await
        {
            Ok(removed) => {
                trace!(
                    connection_id = connection_id,
                    subscription_id = subscription_id,
                    removed = removed,
                    "CLOSE処理完了"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    connection_id = connection_id,
                    subscription_id = subscription_id,
                    error = %e,
                    "サブスクリプション削除失敗"
                );
                self.send_notice(connection_id).await;
                Err(e.into())
            }
        }
    }

    async fn send_notice(&self, connection_id: &str) {
        let notice = RelayMessage::notice(SUBSCRIPTION_ERROR_NOTICE);
        let _ = self.ws_sender.send(connection_id, &notice.to_json()).await;
    }
}
