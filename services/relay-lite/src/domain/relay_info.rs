// リレー情報ドキュメント
//
// HTTPの GET / で返すリレーのメタデータ（NIP-11形式のサブセット）。

use serde::Serialize;

/// リレー情報ドキュメント
///
/// JSONシリアライズ時に未設定のオプションフィールドは省略される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayInfoDocument {
    /// リレーの識別名
    pub name: String,

    /// リレーの詳細説明
    pub description: String,

    /// 管理者の32バイトhex公開鍵
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,

    /// 代替連絡先URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    /// サポートするNIP番号の配列
    pub supported_nips: Vec<u32>,

    /// リレーソフトウェア識別子
    pub software: String,

    /// ソフトウェアのバージョン文字列
    pub version: String,
}

/// リレーソフトウェア識別子（固定値）
pub const SOFTWARE: &str = "tesseract/relay-lite";

/// 現在サポートしているNIP番号
pub const SUPPORTED_NIPS: &[u32] = &[1, 11];

impl RelayInfoDocument {
    /// 新しいリレー情報ドキュメントを作成
    ///
    /// software / version / supported_nips は固定値で埋める。
    pub fn new(
        name: String,
        description: String,
        pubkey: Option<String>,
        contact: Option<String>,
    ) -> Self {
        Self {
            name,
            description,
            pubkey,
            contact,
            supported_nips: SUPPORTED_NIPS.to_vec(),
            software: SOFTWARE.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
