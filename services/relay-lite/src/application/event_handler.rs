/// EVENTメッセージハンドラー
///
/// イベントの検証、保存、購読者への配信を行う
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::domain::{Event, EventValidator, RelayMessage};
use crate::infrastructure::{
    EventRepository, PublishGate, SaveResult, SubscriptionRepository, WebSocketSender,
};

/// EVENTメッセージを処理するハンドラー
pub struct EventHandler<ER, SR, WS>
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
    /// 保存・配信の直列化
    gate: PublishGate,
}

impl<ER, SR, WS> EventHandler<ER, SR, WS>
where
    ER: EventRepository,
    SR: SubscriptionRepository,
    WS: WebSocketSender,
{
    /// 新しいEventHandlerを作成
    pub fn new(event_repo: ER, subscription_repo: SR, ws_sender: WS, gate: PublishGate) -> Self {
        Self {
            event_repo,
            subscription_repo,
            ws_sender,
            gate,
        }
    }

    /// EVENTメッセージを処理
    ///
    /// # 処理フロー
    /// 1. id / sig の存在確認（欠落時は "invalid event"）
    /// 2. 構造・ID・署名の検証（失敗時は "invalid"）
    /// 3. ストアに保存（重複は無視）
    /// 4. 重複かどうかに関わらず、マッチする全購読者に配信
    /// 5. OK応答を返却（配信の後に送られる）
    ///
    /// 3と4はゲート内で行い、REQのバックログ送信と交差させない。
    ///
    /// # 戻り値
    /// 送信元に返すOKメッセージ
    pub async fn handle(&self, event_json: Value, connection_id: &str) -> RelayMessage {
        // イベントIDを取得（検証前でもOK応答に使用）
        let event_id = EventValidator::event_id_hint(&event_json);

        trace!(
            connection_id = connection_id,
            event_id = %event_id,
            "EVENTメッセージ処理開始"
        );

        let event = match EventValidator::validate_all(&event_json) {
            Ok(event) => event,
            Err(err) => {
                debug!(
                    connection_id = connection_id,
                    event_id = %event_id,
                    error = %err,
                    "イベント検証失敗"
                );
                return RelayMessage::ok_rejected(&event_id, err.reason());
            }
        };

        let _gate = self.gate.enter().await;

        match self.event_repo.save(&event).await {
            Ok(SaveResult::Saved) => {
                debug!(
                    event_id = %event_id,
                    kind = event.kind,
                    "イベント保存完了、購読者へ配信"
                );
            }
            Ok(SaveResult::Duplicate) => {
                debug!(
                    event_id = %event_id,
                    "重複イベント検出、購読者へ再配信"
                );
            }
            Err(err) => {
                warn!(
                    connection_id = connection_id,
                    event_id = %event_id,
                    error = %err,
                    "イベント保存失敗"
                );
                return RelayMessage::ok_storage_error(&event_id);
            }
        }

        self.broadcast_to_subscribers(&event).await;
        RelayMessage::ok_success(&event_id)
    }

    /// マッチする購読者にイベントを配信
    ///
    /// 配信順は接続の到着順、接続内ではサブスクリプションの作成順。
    async fn broadcast_to_subscribers(&self, event: &Event) {
        let event_id = &event.id;

        let matched = match self.subscription_repo.find_matching(event).await {
            Ok(matched) => {
                trace!(
                    event_id = %event_id,
                    matched_count = matched.len(),
                    "サブスクリプション検索完了"
                );
                matched
            }
            Err(err) => {
                // エラー時はブロードキャストをスキップ
                warn!(
                    event_id = %event_id,
                    error = %err,
                    "サブスクリプション検索エラー"
                );
                return;
            }
        };

        for subscription in matched {
            let message_json =
                RelayMessage::event(&subscription.subscription_id, event.clone()).to_json();

            if let Err(err) = self
                .ws_sender
                .send(&subscription.connection_id, &message_json)
                .await
            {
                warn!(
                    event_id = %event_id,
                    connection_id = %subscription.connection_id,
                    subscription_id = %subscription.subscription_id,
                    error = %err,
                    "WebSocket送信エラー"
                );
            } else {
                trace!(
                    event_id = %event_id,
                    connection_id = %subscription.connection_id,
                    subscription_id = %subscription.subscription_id,
                    "イベント配信成功"
                );
            }
        }
    }
}
