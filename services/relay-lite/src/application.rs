// アプリケーション層モジュール
pub mod connect_handler;
pub mod disconnect_handler;
pub mod event_handler;
pub mod message_parser;
pub mod nip11_handler;
pub mod relay_session;
pub mod subscription_handler;

// 再エクスポート
pub use connect_handler::{ConnectHandler, ConnectHandlerError};
pub use disconnect_handler::{DisconnectHandler, DisconnectHandlerError};
pub use event_handler::EventHandler;
pub use message_parser::{ClientMessage, MessageParser, ParseError};
pub use nip11_handler::Nip11Handler;
pub use relay_session::{RelaySession, SessionState};
pub use subscription_handler::{SubscriptionHandler, SubscriptionHandlerError};
