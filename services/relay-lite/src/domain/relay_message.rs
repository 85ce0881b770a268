/// Relay to client messages for NIP-01
use serde_json::json;

use crate::domain::Event;

/// Relay to Client messages
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    /// Delivery of a matching event to a subscription
    /// ["EVENT", <subscription_id>, <event JSON>]
    Event {
        subscription_id: String,
        event: Event,
    },

    /// Acknowledgment of an EVENT submission
    /// ["OK", <event_id>, <true|false>, <message>]
    Ok {
        event_id: String,
        accepted: bool,
        message: String,
    },

    /// End of stored events for a subscription
    /// ["EOSE", <subscription_id>]
    Eose { subscription_id: String },

    /// Protocol-level diagnostic
    /// ["NOTICE", <message>]
    Notice { message: String },
}

impl RelayMessage {
    /// Convert message to JSON string
    pub fn to_json(&self) -> String {
        match self {
            RelayMessage::Event {
                subscription_id,
                event,
            } => json!(["EVENT", subscription_id, event]).to_string(),

            RelayMessage::Ok {
                event_id,
                accepted,
                message,
            } => json!(["OK", event_id, accepted, message]).to_string(),

            RelayMessage::Eose { subscription_id } => json!(["EOSE", subscription_id]).to_string(),

            RelayMessage::Notice { message } => json!(["NOTICE", message]).to_string(),
        }
    }

    pub fn event(subscription_id: &str, event: Event) -> Self {
        RelayMessage::Event {
            subscription_id: subscription_id.to_string(),
            event,
        }
    }

    pub fn eose(subscription_id: &str) -> Self {
        RelayMessage::Eose {
            subscription_id: subscription_id.to_string(),
        }
    }

    // ==================== OK Message Helpers ====================

    /// Accepted (also used for duplicates)
    pub fn ok_success(event_id: &str) -> Self {
        RelayMessage::Ok {
            event_id: event_id.to_string(),
            accepted: true,
            message: String::new(),
        }
    }

    /// Rejected with a reason
    pub fn ok_rejected(event_id: &str, reason: &str) -> Self {
        RelayMessage::Ok {
            event_id: event_id.to_string(),
            accepted: false,
            message: reason.to_string(),
        }
    }

    /// Rejected because `id` or `sig` is missing
    pub fn ok_invalid_event(event_id: &str) -> Self {
        Self::ok_rejected(event_id, "invalid event")
    }

    /// Rejected because the id or signature does not verify
    pub fn ok_invalid(event_id: &str) -> Self {
        Self::ok_rejected(event_id, "invalid")
    }

    /// Rejected because the store could not be updated
    pub fn ok_storage_error(event_id: &str) -> Self {
        Self::ok_rejected(event_id, "error: failed to store event")
    }

    // ==================== NOTICE Message Helpers ====================

    pub fn notice(message: impl Into<String>) -> Self {
        RelayMessage::Notice {
            message: message.into(),
        }
    }

    /// Payload is not JSON
    pub fn notice_invalid_json() -> Self {
        Self::notice("invalid json")
    }

    /// Payload is not an array with a string tag
    pub fn notice_invalid_format() -> Self {
        Self::notice("invalid message format")
    }

    pub fn notice_unknown_type(message_type: &str) -> Self {
        Self::notice(format!("unknown type: {}", message_type))
    }

    /// Frame is missing arguments (e.g. REQ without a subscription id)
    pub fn notice_missing_fields() -> Self {
        Self::notice("missing required fields")
    }

    pub fn notice_invalid_filter(detail: &str) -> Self {
        Self::notice(format!("invalid filter: {}", detail))
    }
}
