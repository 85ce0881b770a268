/// 全接続のサブスクリプションを管理するリポジトリ
///
/// 接続は到着順、サブスクリプションは接続内の作成順で保持し、
/// ブロードキャスト時の配信順をこの順序で決定する。
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Event, Filter, SubscriptionRegistry};

/// サブスクリプションリポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubscriptionRepositoryError {
    /// 書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// 読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),
}

/// マッチしたサブスクリプション情報
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedSubscription {
    /// 接続ID
    pub connection_id: String,
    /// サブスクリプションID
    pub subscription_id: String,
}

/// サブスクリプション管理用トレイト
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// 接続を到着順の末尾に登録（登録済みなら何もしない）
    async fn register_connection(&self, connection_id: &str)
    -> Result<(), SubscriptionRepositoryError>;

    /// サブスクリプションを保存（既存は作成順を保ったまま上書き）
    ///
    /// 未登録の接続の場合は接続ごと登録する。
    async fn upsert(
        &self,
        connection_id: &str,
        subscription_id: &str,
        filter: &Filter,
    ) -> Result<(), SubscriptionRepositoryError>;

    /// サブスクリプションを削除
    ///
    /// 存在しなかった場合は `Ok(false)`。
    async fn delete(
        &self,
        connection_id: &str,
        subscription_id: &str,
    ) -> Result<bool, SubscriptionRepositoryError>;

    /// 接続と、その全サブスクリプションを削除
    async fn delete_by_connection(
        &self,
        connection_id: &str,
    ) -> Result<(), SubscriptionRepositoryError>;

    /// イベントにマッチするサブスクリプションを配信順で返す
    async fn find_matching(
        &self,
        event: &Event,
    ) -> Result<Vec<MatchedSubscription>, SubscriptionRepositoryError>;

    /// 特定のサブスクリプションのフィルターを取得
    async fn get(
        &self,
        connection_id: &str,
        subscription_id: &str,
    ) -> Result<Option<Filter>, SubscriptionRepositoryError>;

    /// 接続のサブスクリプション数
    async fn count_by_connection(
        &self,
        connection_id: &str,
    ) -> Result<usize, SubscriptionRepositoryError>;
}

/// 接続ID + その接続のレジストリ
type ConnectionEntry = (String, SubscriptionRegistry);

/// SubscriptionRepositoryのインメモリ実装
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepository {
    connections: Arc<RwLock<Vec<ConnectionEntry>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中の接続数
    pub fn connection_count(&self) -> Result<usize, SubscriptionRepositoryError> {
        let connections = self
            .connections
            .read()
            .map_err(|e| SubscriptionRepositoryError::ReadError(e.to_string()))?;
        Ok(connections.len())
    }

    fn write_error<E: std::fmt::Display>(e: E) -> SubscriptionRepositoryError {
        SubscriptionRepositoryError::WriteError(e.to_string())
    }

    fn read_error<E: std::fmt::Display>(e: E) -> SubscriptionRepositoryError {
        SubscriptionRepositoryError::ReadError(e.to_string())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn register_connection(
        &self,
        connection_id: &str,
    ) -> Result<(), SubscriptionRepositoryError> {
        let mut connections = self.connections.write().map_err(Self::write_error)?;
        if !connections.iter().any(|(id, _)| id == connection_id) {
            connections.push((connection_id.to_string(), SubscriptionRegistry::new()));
        }
        Ok(())
    }

    async fn upsert(
        &self,
        connection_id: &str,
        subscription_id: &str,
        filter: &Filter,
    ) -> Result<(), SubscriptionRepositoryError> {
        let mut connections = self.connections.write().map_err(Self::write_error)?;

        match connections.iter_mut().find(|(id, _)| id == connection_id) {
            Some((_, registry)) => {
                registry.upsert(subscription_id, filter.clone());
            }
            None => {
                let mut registry = SubscriptionRegistry::new();
                registry.upsert(subscription_id, filter.clone());
                connections.push((connection_id.to_string(), registry));
            }
        }

        Ok(())
    }

    async fn delete(
        &self,
        connection_id: &str,
        subscription_id: &str,
    ) -> Result<bool, SubscriptionRepositoryError> {
        let mut connections = self.connections.write().map_err(Self::write_error)?;
        Ok(connections
            .iter_mut()
            .find(|(id, _)| id == connection_id)
            .is_some_and(|(_, registry)| registry.remove(subscription_id)))
    }

    async fn delete_by_connection(
        &self,
        connection_id: &str,
    ) -> Result<(), SubscriptionRepositoryError> {
        let mut connections = self.connections.write().map_err(Self::write_error)?;
        connections.retain(|(id, _)| id != connection_id);
        Ok(())
    }

    async fn find_matching(
        &self,
        event: &Event,
    ) -> Result<Vec<MatchedSubscription>, SubscriptionRepositoryError> {
        let connections = self.connections.read().map_err(Self::read_error)?;

        Ok(connections
            .iter()
            .flat_map(|(connection_id, registry)| {
                registry
                    .matching_ids(event)
                    .map(move |subscription_id| MatchedSubscription {
                        connection_id: connection_id.clone(),
                        subscription_id: subscription_id.to_string(),
                    })
            })
            .collect())
    }

    async fn get(
        &self,
        connection_id: &str,
        subscription_id: &str,
    ) -> Result<Option<Filter>, SubscriptionRepositoryError> {
        let connections = self.connections.read().map_err(Self::read_error)?;
        Ok(connections
            .iter()
            .find(|(id, _)| id == connection_id)
            .and_then(|(_, registry)| registry.get(subscription_id))
            .map(|subscription| subscription.filter.clone()))
    }

    async fn count_by_connection(
        &self,
        connection_id: &str,
    ) -> Result<usize, SubscriptionRepositoryError> {
        let connections = self.connections.read().map_err(Self::read_error)?;
        Ok(connections
            .iter()
            .find(|(id, _)| id == connection_id)
            .map(|(_, registry)| registry.len())
            .unwrap_or(0))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::domain::UnsignedEvent;
    use std::sync::Mutex;

    // ==================== エラー型テスト ====================

    #[test]
    fn test_subscription_repository_error_write_error_display() {
        let error = SubscriptionRepositoryError::WriteError("poisoned".to_string());
        assert_eq!(error.to_string(), "Write error: poisoned");
    }

    #[test]
    fn test_subscription_repository_error_read_error_display() {
        let error = SubscriptionRepositoryError::ReadError("poisoned".to_string());
        assert_eq!(error.to_string(), "Read error: poisoned");
    }

    // ==================== モックサブスクリプションリポジトリ ====================

    /// ユニットテスト用のモックSubscriptionRepository
    ///
    /// インメモリ実装に委譲しつつ、upsertでエラーを返せる。
    #[derive(Debug, Clone, Default)]
    pub struct MockSubscriptionRepository {
        inner: InMemorySubscriptionRepository,
        upsert_error: Arc<Mutex<Option<SubscriptionRepositoryError>>>,
    }

    impl MockSubscriptionRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_upsert_error(&self, error: SubscriptionRepositoryError) {
            *self.upsert_error.lock().unwrap() = Some(error);
        }

        pub fn connection_count(&self) -> usize {
            self.inner.connection_count().unwrap()
        }
    }

    #[async_trait]
    impl SubscriptionRepository for MockSubscriptionRepository {
        async fn register_connection(
            &self,
            connection_id: &str,
        ) -> Result<(), SubscriptionRepositoryError> {
            self.inner.register_connection(connection_id).await
        }

        async fn upsert(
            &self,
            connection_id: &str,
            subscription_id: &str,
            filter: &Filter,
        ) -> Result<(), SubscriptionRepositoryError> {
            if let Some(error) = self.upsert_error.lock().unwrap().take() {
                return Err(error);
            }
            self.inner.upsert(connection_id, subscription_id, filter).await
        }

        async fn delete(
            &self,
            connection_id: &str,
            subscription_id: &str,
        ) -> Result<bool, SubscriptionRepositoryError> {
            self.inner.delete(connection_id, subscription_id).await
        }

        async fn delete_by_connection(
            &self,
            connection_id: &str,
        ) -> Result<(), SubscriptionRepositoryError> {
            self.inner.delete_by_connection(connection_id).await
        }

        async fn find_matching(
            &self,
            event: &Event,
        ) -> Result<Vec<MatchedSubscription>, SubscriptionRepositoryError> {
            self.inner.find_matching(event).await
        }

        async fn get(
            &self,
            connection_id: &str,
            subscription_id: &str,
        ) -> Result<Option<Filter>, SubscriptionRepositoryError> {
            self.inner.get(connection_id, subscription_id).await
        }

        async fn count_by_connection(
            &self,
            connection_id: &str,
        ) -> Result<usize, SubscriptionRepositoryError> {
            self.inner.count_by_connection(connection_id).await
        }
    }

    fn create_test_event(kind: u64) -> Event {
        UnsignedEvent {
            pubkey: "a".repeat(64),
            created_at: 1_000,
            kind,
            tags: vec![],
            content: "test".to_string(),
        }
        .into_signed("1".repeat(64), "2".repeat(128))
    }

    fn matched(connection_id: &str, subscription_id: &str) -> MatchedSubscription {
        MatchedSubscription {
            connection_id: connection_id.to_string(),
            subscription_id: subscription_id.to_string(),
        }
    }

    // ==================== InMemorySubscriptionRepository ====================

    #[tokio::test]
    async fn test_upsert_success() {
        let repo = InMemorySubscriptionRepository::new();
        repo.upsert("conn-1", "sub-1", &Filter::new().kinds([1]))
            .await
            .unwrap();

        assert_eq!(
            repo.get("conn-1", "sub-1").await.unwrap(),
            Some(Filter::new().kinds([1]))
        );
        assert_eq!(repo.count_by_connection("conn-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrite() {
        let repo = InMemorySubscriptionRepository::new();
        repo.upsert("conn-1", "sub-1", &Filter::new().kinds([1]))
            .await
            .unwrap();
        repo.upsert("conn-1", "sub-1", &Filter::new().kinds([7]))
            .await
            .unwrap();

        assert_eq!(repo.count_by_connection("conn-1").await.unwrap(), 1);
        assert_eq!(
            repo.get("conn-1", "sub-1").await.unwrap(),
            Some(Filter::new().kinds([7]))
        );
    }

    #[tokio::test]
    async fn test_same_subscription_id_on_different_connections() {
        let repo = InMemorySubscriptionRepository::new();
        repo.upsert("conn-1", "sub", &Filter::new()).await.unwrap();
        repo.upsert("conn-2", "sub", &Filter::new().kinds([0]))
            .await
            .unwrap();

        assert_eq!(repo.get("conn-1", "sub").await.unwrap(), Some(Filter::new()));
        assert_eq!(
            repo.get("conn-2", "sub").await.unwrap(),
            Some(Filter::new().kinds([0]))
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemorySubscriptionRepository::new();
        repo.upsert("conn-1", "sub-1", &Filter::new()).await.unwrap();

        assert!(repo.delete("conn-1", "sub-1").await.unwrap());
        assert!(!repo.delete("conn-1", "sub-1").await.unwrap());
        assert!(!repo.delete("conn-unknown", "sub-1").await.unwrap());
        assert_eq!(repo.get("conn-1", "sub-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_by_connection() {
        let repo = InMemorySubscriptionRepository::new();
        repo.upsert("conn-1", "sub-1", &Filter::new()).await.unwrap();
        repo.upsert("conn-1", "sub-2", &Filter::new()).await.unwrap();
        repo.upsert("conn-2", "sub-1", &Filter::new()).await.unwrap();

        repo.delete_by_connection("conn-1").await.unwrap();

        assert_eq!(repo.count_by_connection("conn-1").await.unwrap(), 0);
        assert_eq!(repo.count_by_connection("conn-2").await.unwrap(), 1);
        assert_eq!(repo.connection_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_matching_order() {
        // 接続の到着順 -> 接続内の作成順
        let repo = InMemorySubscriptionRepository::new();
        repo.register_connection("conn-a").await.unwrap();
        repo.register_connection("conn-b").await.unwrap();

        repo.upsert("conn-b", "b1", &Filter::new()).await.unwrap();
        repo.upsert("conn-a", "a2", &Filter::new().kinds([1]))
            .await
            .unwrap();
        repo.upsert("conn-a", "a1", &Filter::new()).await.unwrap();
        repo.upsert("conn-b", "b2", &Filter::new().kinds([0]))
            .await
            .unwrap();

        let result = repo.find_matching(&create_test_event(1)).await.unwrap();
        assert_eq!(
            result,
            vec![
                matched("conn-a", "a2"),
                matched("conn-a", "a1"),
                matched("conn-b", "b1"),
            ]
        );
    }

    #[tokio::test]
    async fn test_find_matching_no_match() {
        let repo = InMemorySubscriptionRepository::new();
        repo.upsert("conn-1", "sub-1", &Filter::new().kinds([0]))
            .await
            .unwrap();
        assert!(repo.find_matching(&create_test_event(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_connection_is_idempotent() {
        let repo = InMemorySubscriptionRepository::new();
        repo.register_connection("conn-1").await.unwrap();
        repo.upsert("conn-1", "sub-1", &Filter::new()).await.unwrap();
        repo.register_connection("conn-1").await.unwrap();

        assert_eq!(repo.connection_count().unwrap(), 1);
        assert_eq!(repo.count_by_connection("conn-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mock_repo_upsert_error() {
        let repo = MockSubscriptionRepository::new();
        repo.set_upsert_error(SubscriptionRepositoryError::WriteError("boom".to_string()));

        let result = repo.upsert("conn-1", "sub-1", &Filter::new()).await;
        assert!(result.is_err());
        assert_eq!(repo.count_by_connection("conn-1").await.unwrap(), 0);
    }
}
