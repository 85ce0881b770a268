/// Filter evaluation for NIP-01 events
///
/// Conditions are ANDed together; an absent condition always passes:
/// - ids: event id is in the list
/// - authors: event pubkey is in the list
/// - kinds: event kind is in the list
/// - since: created_at >= since
/// - until: created_at <= until
/// - #e / #p: some tag of that name has its value in the list
use crate::domain::{Event, Filter};

/// Filter evaluator for matching events against NIP-01 filters
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Check if an event satisfies every constraint present in the filter
    pub fn matches(event: &Event, filter: &Filter) -> bool {
        if let Some(ids) = &filter.ids {
            if !ids.iter().any(|id| *id == event.id) {
                return false;
            }
        }

        if let Some(authors) = &filter.authors {
            if !authors.iter().any(|author| *author == event.pubkey) {
                return false;
            }
        }

        if let Some(kinds) = &filter.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }

        if let Some(since) = filter.since {
            if event.created_at < since {
                return false;
            }
        }

        if let Some(until) = filter.until {
            if event.created_at > until {
                return false;
            }
        }

        if let Some(values) = &filter.e_tags {
            if !Self::matches_tag(event, "e", values) {
                return false;
            }
        }

        if let Some(values) = &filter.p_tags {
            if !Self::matches_tag(event, "p", values) {
                return false;
            }
        }

        true
    }

    /// Whether any `name` tag on the event carries one of `values`
    fn matches_tag(event: &Event, name: &str, values: &[String]) -> bool {
        event
            .tag_values(name)
            .any(|tag_value| values.iter().any(|v| v == tag_value))
    }
}
