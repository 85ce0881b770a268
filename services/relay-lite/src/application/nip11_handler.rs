// リレー情報レスポンス生成ハンドラー
//
// 設定コンポーネントからリレー情報を取得し、
// GET / に返すJSONレスポンスを構築する。

use axum::http::header::{CONTENT_TYPE, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::domain::RelayInfoDocument;
use crate::infrastructure::RelayInfoConfig;

/// リレー情報ドキュメントのContent-Type
pub const NOSTR_JSON_CONTENT_TYPE: &str = "application/nostr+json";

/// リレー情報レスポンス生成ハンドラー
///
/// CORSヘッダーはルーター側の`CorsLayer`で付与する。
#[derive(Debug, Clone)]
pub struct Nip11Handler {
    /// リレー情報設定
    config: RelayInfoConfig,
}

impl Nip11Handler {
    /// 新しいハンドラーを作成
    pub fn new(config: RelayInfoConfig) -> Self {
        Self { config }
    }

    /// リレー情報ドキュメントを生成
    pub fn build_relay_info(&self) -> RelayInfoDocument {
        self.config.to_document()
    }

    /// リレー情報をJSONとしてシリアライズ
    pub fn build_relay_info_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.build_relay_info())
    }

    /// GETリクエストを処理してレスポンスを生成
    pub fn handle(&self) -> Response {
        match self.build_relay_info_json() {
            Ok(json) => (
                [(CONTENT_TYPE, HeaderValue::from_static(NOSTR_JSON_CONTENT_TYPE))],
                json,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "リレー情報のシリアライズ失敗");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
