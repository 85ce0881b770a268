/// 容量制限付きのインメモリイベントログ
///
/// 挿入順を保持するキューと既出IDの集合を常に同期させる。
/// 容量を超えた場合は挿入順で最も古いイベントから削除する（created_at順ではない）。
use std::collections::{HashSet, VecDeque};

use crate::domain::{Event, Filter, FilterEvaluator};

/// デフォルトの保持イベント数
pub const DEFAULT_CAPACITY: usize = 5000;

/// 重複排除付きの挿入順イベントログ
#[derive(Debug, Clone)]
pub struct EventStore {
    events: VecDeque<Event>,
    seen_ids: HashSet<String>,
    capacity: usize,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保持上限を指定して作成（0は1として扱う）
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            seen_ids: HashSet::new(),
            capacity,
        }
    }

    /// 未保存のイベントなら末尾に追加して `true` を返す
    ///
    /// 既に同じIDがあれば何もせず `false`。
    pub fn try_insert(&mut self, event: Event) -> bool {
        if self.seen_ids.contains(&event.id) {
            return false;
        }

        self.seen_ids.insert(event.id.clone());
        self.events.push_back(event);

        while self.events.len() > self.capacity {
            if let Some(evicted) = self.events.pop_front() {
                self.seen_ids.remove(&evicted.id);
            }
        }

        true
    }

    /// フィルターにマッチするイベントのうち、挿入順で最新の `effective_limit` 件を返す
    ///
    /// 返却順は挿入順（古い順）。
    pub fn query(&self, filter: &Filter) -> Vec<Event> {
        let limit = filter.effective_limit();

        // 末尾から走査し、上限に達したら打ち切る
        let mut matched: Vec<Event> = self
            .events
            .iter()
            .rev()
            .filter(|event| FilterEvaluator::matches(event, filter))
            .take(limit)
            .cloned()
            .collect();
        matched.reverse();
        matched
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.seen_ids.contains(event_id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
