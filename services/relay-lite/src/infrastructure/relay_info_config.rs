// リレー情報設定
//
// 環境変数からリレー情報ドキュメントに載せる値を読み込む。

use crate::domain::RelayInfoDocument;

/// RELAY_NAME未設定時のリレー名
pub const DEFAULT_RELAY_NAME: &str = "Tesseract Relay Lite";

/// RELAY_DESCRIPTION未設定時の説明
pub const DEFAULT_RELAY_DESCRIPTION: &str = "Minimal NIP-01 relay (in-memory)";

/// リレー情報設定
///
/// 未設定のオプションフィールドは`None`として扱う。
#[derive(Debug, Clone, PartialEq)]
pub struct RelayInfoConfig {
    /// リレー名 (RELAY_NAME環境変数)
    pub name: String,
    /// リレー説明 (RELAY_DESCRIPTION環境変数)
    pub description: String,
    /// 管理者公開鍵 (RELAY_PUBKEY環境変数、64文字hex)
    pub pubkey: Option<String>,
    /// 連絡先URI (RELAY_CONTACT環境変数)
    pub contact: Option<String>,
}

impl Default for RelayInfoConfig {
    fn default() -> Self {
        Self::new(None, None, None, None)
    }
}

impl RelayInfoConfig {
    /// 環境変数から設定を読み込み
    ///
    /// - RELAY_NAME: リレー名
    /// - RELAY_DESCRIPTION: リレー説明
    /// - RELAY_PUBKEY: 管理者公開鍵（64文字hex、無効な場合は無視）
    /// - RELAY_CONTACT: 連絡先URI
    pub fn from_env() -> Self {
        // 空文字はNone扱い
        let get_optional_string = |key: &str| -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.trim().is_empty())
        };

        let pubkey = get_optional_string("RELAY_PUBKEY").filter(|p| {
            let valid = is_valid_pubkey(p);
            if !valid {
                tracing::warn!(pubkey = %p, "RELAY_PUBKEYが64文字のhexではないため無視します");
            }
            valid
        });

        Self::new(
            get_optional_string("RELAY_NAME"),
            get_optional_string("RELAY_DESCRIPTION"),
            pubkey,
            get_optional_string("RELAY_CONTACT"),
        )
    }

    /// 明示的な値で作成（名前・説明は未指定ならデフォルト値）
    pub fn new(
        name: Option<String>,
        description: Option<String>,
        pubkey: Option<String>,
        contact: Option<String>,
    ) -> Self {
        Self {
            name: name.unwrap_or_else(|| DEFAULT_RELAY_NAME.to_string()),
            description: description.unwrap_or_else(|| DEFAULT_RELAY_DESCRIPTION.to_string()),
            pubkey,
            contact,
        }
    }

    /// リレー情報ドキュメントに変換
    pub fn to_document(&self) -> RelayInfoDocument {
        RelayInfoDocument::new(
            self.name.clone(),
            self.description.clone(),
            self.pubkey.clone(),
            self.contact.clone(),
        )
    }
}

/// pubkeyが有効な64文字hex文字列かどうか
pub fn is_valid_pubkey(pubkey: &str) -> bool {
    pubkey.len() == 64 && pubkey.chars().all(|c| c.is_ascii_hexdigit())
}
