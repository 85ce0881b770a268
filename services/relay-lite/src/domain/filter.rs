/// NIP-01 subscription filter
///
/// Only the `#e` and `#p` tag constraints are understood; any other key in the
/// filter object is ignored.
use serde::{Deserialize, Serialize};

/// Backlog size used when a filter carries no usable `limit`
pub const DEFAULT_QUERY_LIMIT: usize = 300;

/// Upper bound on backlog size regardless of the requested `limit`
pub const MAX_QUERY_LIMIT: usize = 500;

/// A conjunction of optional constraints over event fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u64>>,
    /// Inclusive lower bound on `created_at`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
    /// Inclusive upper bound on `created_at`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Accepted values for `e` tags
    #[serde(rename = "#e", default, skip_serializing_if = "Option::is_none")]
    pub e_tags: Option<Vec<String>>,
    /// Accepted values for `p` tags
    #[serde(rename = "#p", default, skip_serializing_if = "Option::is_none")]
    pub p_tags: Option<Vec<String>>,
}

impl Filter {
    /// Empty filter (matches every event)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = Some(authors.into_iter().map(Into::into).collect());
        self
    }

    pub fn kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn since(mut self, since: u64) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: u64) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn e_tags<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.e_tags = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn p_tags<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.p_tags = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Number of backlog events to return for this filter
    ///
    /// `limit` is capped at [`MAX_QUERY_LIMIT`]; a missing or zero `limit`
    /// falls back to [`DEFAULT_QUERY_LIMIT`].
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => usize::try_from(limit)
                .unwrap_or(MAX_QUERY_LIMIT)
                .min(MAX_QUERY_LIMIT),
            _ => DEFAULT_QUERY_LIMIT,
        }
    }
}
