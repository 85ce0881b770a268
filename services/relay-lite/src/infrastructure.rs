// Infrastructure layer modules
pub mod config;
pub mod event_repository;
pub mod event_store;
pub mod logging;
pub mod publish_gate;
pub mod relay_info_config;
pub mod subscription_repository;
pub mod websocket_sender;
pub mod ws_server;

// Re-exports
pub use config::{RelayConfig, RelayConfigError};
pub use event_repository::{
    EventRepository, EventRepositoryError, InMemoryEventRepository, SaveResult,
};
pub use event_store::EventStore;
pub use logging::init_logging;
pub use publish_gate::PublishGate;
pub use relay_info_config::RelayInfoConfig;
pub use subscription_repository::{
    InMemorySubscriptionRepository, MatchedSubscription, SubscriptionRepository,
    SubscriptionRepositoryError,
};
pub use websocket_sender::{ChannelWebSocketSender, SendError, WebSocketSender};
pub use ws_server::{AppState, ServerError, create_router, serve, serve_with_listener};
