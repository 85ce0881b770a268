/// 接続ごとのサブスクリプション管理
///
/// サブスクリプションIDは接続内でのみ一意。作成順を保持し、
/// 同一IDでの再登録は元の位置のままフィルターだけを置き換える。
use crate::domain::{Event, Filter, FilterEvaluator};

/// サブスクリプション（ID + フィルター）
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub filter: Filter,
}

/// 1接続分のサブスクリプション一覧
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録または上書き
    ///
    /// 上書きした場合は `true` を返す。
    pub fn upsert(&mut self, subscription_id: &str, filter: Filter) -> bool {
        if let Some(existing) = self
            .subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id)
        {
            existing.filter = filter;
            return true;
        }

        self.subscriptions.push(Subscription {
            id: subscription_id.to_string(),
            filter,
        });
        false
    }

    /// 削除（存在しなければ `false`）
    pub fn remove(&mut self, subscription_id: &str) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != subscription_id);
        self.subscriptions.len() != before
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn get(&self, subscription_id: &str) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.id == subscription_id)
    }

    /// 作成順に走査
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.iter()
    }

    /// イベントにマッチするサブスクリプションIDを作成順で返す
    pub fn matching_ids<'a>(&'a self, event: &'a Event) -> impl Iterator<Item = &'a str> + 'a {
        self.subscriptions
            .iter()
            .filter(move |s| FilterEvaluator::matches(event, &s.filter))
            .map(|s| s.id.as_str())
    }
}
