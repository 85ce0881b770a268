//! インメモリで動作する最小構成のNIP-01リレー
//!
//! - `domain`: イベント、フィルター、署名、サブスクリプションのモデル
//! - `application`: EVENT / REQ / CLOSE の処理とセッション状態機械
//! - `infrastructure`: ストア、送信チャネル、設定、ログ、HTTP/WebSocketサーバー

// Domain layer modules
pub mod domain;

// Application layer modules
pub mod application;

// Infrastructure layer modules
pub mod infrastructure;
