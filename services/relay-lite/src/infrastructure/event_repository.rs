/// イベントの保存・検索を抽象化するリポジトリ
///
/// リレーインスタンス全体で1つのEventStoreを共有し、
/// 重複判定と追加・削除を1つのロック内で行う。
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Event, Filter};
use crate::infrastructure::event_store::EventStore;

/// イベントリポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EventRepositoryError {
    /// 書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// 読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),
}

/// イベント保存結果
#[derive(Debug, Clone, PartialEq)]
pub enum SaveResult {
    /// 新しいイベントとして保存された
    Saved,
    /// 重複イベント（同一IDが既に存在）
    Duplicate,
}

/// イベント永続化用トレイト
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// イベントを保存
    ///
    /// 同一IDが既に存在する場合は `SaveResult::Duplicate`（エラーではない）。
    async fn save(&self, event: &Event) -> Result<SaveResult, EventRepositoryError>;

    /// フィルターにマッチするイベントを挿入順で返す（件数は `Filter::effective_limit` まで）
    async fn query(&self, filter: &Filter) -> Result<Vec<Event>, EventRepositoryError>;
}

/// EventRepositoryのインメモリ実装
#[derive(Debug, Clone)]
pub struct InMemoryEventRepository {
    store: Arc<Mutex<EventStore>>,
}

impl Default for InMemoryEventRepository {
    fn default() -> Self {
        Self::new(EventStore::new())
    }
}

impl InMemoryEventRepository {
    pub fn new(store: EventStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// 保持上限を指定して作成
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(EventStore::with_capacity(capacity))
    }

    /// 現在の保持件数
    pub fn len(&self) -> Result<usize, EventRepositoryError> {
        let store = self
            .store
            .lock()
            .map_err(|e| EventRepositoryError::ReadError(e.to_string()))?;
        Ok(store.len())
    }

    pub fn is_empty(&self) -> Result<bool, EventRepositoryError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn save(&self, event: &Event) -> Result<SaveResult, EventRepositoryError> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| EventRepositoryError::WriteError(e.to_string()))?;

        if store.try_insert(event.clone()) {
            tracing::trace!(
                event_id = %event.id,
                stored_count = store.len(),
                "イベントを保存"
            );
            Ok(SaveResult::Saved)
        } else {
            Ok(SaveResult::Duplicate)
        }
    }

    async fn query(&self, filter: &Filter) -> Result<Vec<Event>, EventRepositoryError> {
        let store = self
            .store
            .lock()
            .map_err(|e| EventRepositoryError::ReadError(e.to_string()))?;
        Ok(store.query(filter))
    }
}
