/// 接続ハンドラー
///
/// WebSocket接続が確立した際の処理を実行する
use tracing::debug;

use crate::infrastructure::{SubscriptionRepository, SubscriptionRepositoryError};

/// 接続ハンドラーのエラー型
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectHandlerError {
    /// 接続IDが空
    EmptyConnectionId,
    /// リポジトリ操作エラー
    RepositoryError(String),
}

impl From<SubscriptionRepositoryError> for ConnectHandlerError {
    fn from(err: SubscriptionRepositoryError) -> Self {
        ConnectHandlerError::RepositoryError(err.to_string())
    }
}

impl std::fmt::Display for ConnectHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectHandlerError::EmptyConnectionId => {
                write!(f, "Connection id must not be empty")
            }
            ConnectHandlerError::RepositoryError(msg) => {
                write!(f, "Repository error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConnectHandlerError {}

/// WebSocket接続を登録するハンドラー
///
/// 接続を到着順の末尾に登録し、以後のブロードキャスト順序を確定させる
pub struct ConnectHandler<SR>
where
    SR: SubscriptionRepository,
{
    /// サブスクリプションリポジトリ
    subscription_repo: SR,
}

impl<SR> ConnectHandler<SR>
where
    SR: SubscriptionRepository,
{
    /// 新しいConnectHandlerを作成
    pub fn new(subscription_repo: SR) -> Self {
        Self { subscription_repo }
    }

    /// WebSocket接続を処理
    ///
    /// # 引数
    /// * `connection_id` - サーバーが払い出した接続ID
    pub async fn handle(&self, connection_id: &str) -> Result<(), ConnectHandlerError> {
        if connection_id.is_empty() {
            return Err(ConnectHandlerError::EmptyConnectionId);
        }

        self.subscription_repo
            .register_connection(connection_id)
            .await?;

        debug!(connection_id = connection_id, "接続登録完了");
        Ok(())
    }
}
