/// 接続ごとの送信チャネルを使ったWebSocketメッセージ送信
///
/// 各接続はアンバウンドなmpscチャネルを持ち、ライタータスクが受信側を
/// ソケットへ書き出す。送信側はチャネルに積むだけなので待機しない。
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// WebSocket送信操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SendError {
    /// 接続が切断された（チャネル未登録または受信側がクローズ済み）
    #[error("Connection is gone")]
    ConnectionGone,
    /// 送信先の管理情報にアクセスできない
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// WebSocketメッセージ送信用トレイト
///
/// 実際のチャネル実装とテスト用モックを差し替え可能にする。
#[async_trait]
pub trait WebSocketSender: Send + Sync {
    /// 特定の接続にメッセージを送信
    ///
    /// # 戻り値
    /// * 成功時は`Ok(())`
    /// * 接続が存在しない場合は`Err(SendError::ConnectionGone)`
    async fn send(&self, connection_id: &str, message: &str) -> Result<(), SendError>;
}

/// mpscチャネルによるWebSocketSender実装
#[derive(Debug, Clone, Default)]
pub struct ChannelWebSocketSender {
    channels: Arc<RwLock<HashMap<String, UnboundedSender<String>>>>,
}

impl ChannelWebSocketSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続の送信チャネルを作成し、受信側を返す
    ///
    /// 同じ接続IDで再登録した場合は古いチャネルを置き換える。
    pub fn register(&self, connection_id: &str) -> Result<UnboundedReceiver<String>, SendError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut channels = self
            .channels
            .write()
            .map_err(|e| SendError::NetworkError(e.to_string()))?;
        channels.insert(connection_id.to_string(), tx);
        Ok(rx)
    }

    /// 接続の送信チャネルを破棄（ライタータスクは残りを書き出して終了する）
    pub fn unregister(&self, connection_id: &str) -> Result<(), SendError> {
        let mut channels = self
            .channels
            .write()
            .map_err(|e| SendError::NetworkError(e.to_string()))?;
        channels.remove(connection_id);
        Ok(())
    }

    pub fn is_registered(&self, connection_id: &str) -> bool {
        self.channels
            .read()
            .map(|channels| channels.contains_key(connection_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl WebSocketSender for ChannelWebSocketSender {
    async fn send(&self, connection_id: &str, message: &str) -> Result<(), SendError> {
        let channels = self
            .channels
            .read()
            .map_err(|e| SendError::NetworkError(e.to_string()))?;

        let tx = channels.get(connection_id).ok_or(SendError::ConnectionGone)?;
        tx.send(message.to_string())
            .map_err(|_| SendError::ConnectionGone)
    }
}
