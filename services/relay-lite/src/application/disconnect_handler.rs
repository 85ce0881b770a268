/// 切断ハンドラー
///
/// WebSocket接続が閉じた際の処理を実行する
use tracing::debug;

use crate::infrastructure::{SubscriptionRepository, SubscriptionRepositoryError};

/// 切断ハンドラーのエラー型
#[derive(Debug, Clone, PartialEq)]
pub enum DisconnectHandlerError {
    /// サブスクリプションリポジトリ操作エラー
    SubscriptionRepositoryError(String),
}

impl From<SubscriptionRepositoryError> for DisconnectHandlerError {
    fn from(err: SubscriptionRepositoryError) -> Self {
        DisconnectHandlerError::SubscriptionRepositoryError(err.to_string())
    }
}

impl std::fmt::Display for DisconnectHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectHandlerError::SubscriptionRepositoryError(msg) => {
                write!(f, "Subscription repository error: {}", msg)
            }
        }
    }
}

impl std::error::Error for DisconnectHandlerError {}

/// WebSocket切断を処理するハンドラー
///
/// 接続に紐づく全サブスクリプションと接続エントリを削除する
pub struct DisconnectHandler<SR>
where
    SR: SubscriptionRepository,
{
    /// サブスクリプションリポジトリ
    subscription_repo: SR,
}

impl<SR> DisconnectHandler<SR>
where
    SR: SubscriptionRepository,
{
    /// 新しいDisconnectHandlerを作成
    pub fn new(subscription_repo: SR) -> Self {
        Self { subscription_repo }
    }

    /// WebSocket切断を処理
    ///
    /// 未登録の接続でも成功する。
    pub async fn handle(&self, connection_id: &str) -> Result<(), DisconnectHandlerError> {
        let removed = self
            .subscription_repo
            .count_by_connection(connection_id)
            .await?;

        self.subscription_repo
            .delete_by_connection(connection_id)
            .await?;

        debug!(
            connection_id = connection_id,
            removed_subscriptions = removed,
            "切断処理完了"
        );
        Ok(())
    }
}
