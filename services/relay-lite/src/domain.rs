// Domain layer modules
pub mod event;
pub mod event_validator;
pub mod filter;
pub mod filter_evaluator;
pub mod relay_info;
pub mod relay_message;
pub mod signature;
pub mod subscription_registry;

// Re-exports
pub use event::{Event, EventCodec, EventTemplate, UnsignedEvent};
pub use event_validator::{EventValidator, ValidationError};
pub use filter::{DEFAULT_QUERY_LIMIT, Filter, MAX_QUERY_LIMIT};
pub use filter_evaluator::FilterEvaluator;
pub use relay_info::RelayInfoDocument;
pub use relay_message::RelayMessage;
pub use signature::{SignatureService, SigningError, VerifyFailure};
pub use subscription_registry::{Subscription, SubscriptionRegistry};
