/// BIP-340 Schnorr鍵管理・署名・検証
///
/// イベントIDのハッシュ計算はEventCodecに委譲し、本モジュールはsecp256k1の操作のみを扱う。
use secp256k1::{Keypair, Message, SECP256K1, SecretKey, XOnlyPublicKey, schnorr};
use thiserror::Error;

use crate::domain::event::{Event, EventCodec, EventTemplate, UnsignedEvent};

/// 鍵操作・署名のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SigningError {
    /// 秘密鍵が16進数としてデコードできない
    #[error("secret key is not valid hex: {0}")]
    InvalidHex(String),
    /// 秘密鍵が32バイトでない、またはsecp256k1の有効範囲外
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),
}

/// 検証失敗の内訳（ログ出力用）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyFailure {
    /// 再計算したIDがevent.idと一致しない
    #[error("event id does not match")]
    IdMismatch,
    /// id / pubkey / sig のいずれかが不正な16進数または長さ
    #[error("malformed field: {0}")]
    Malformed(&'static str),
    /// Schnorr署名の検証に失敗
    #[error("signature verification failed")]
    BadSignature,
}

/// 鍵生成・署名・検証サービス
pub struct SignatureService;

impl SignatureService {
    /// ランダムな秘密鍵を生成し、16進数文字列で返す
    pub fn generate_key() -> String {
        let secret_key = SecretKey::new(&mut secp256k1::rand::thread_rng());
        hex::encode(secret_key.secret_bytes())
    }

    /// 秘密鍵からx-only公開鍵（32バイト、16進数）を導出
    pub fn derive_public_key(secret_key_hex: &str) -> Result<String, SigningError> {
        let keypair = Self::parse_keypair(secret_key_hex)?;
        let (xonly, _parity) = keypair.x_only_public_key();
        Ok(hex::encode(xonly.serialize()))
    }

    /// 未署名イベントにIDと署名を付与する
    ///
    /// `fields.pubkey` は呼び出し側の責任で秘密鍵と対応させること。
    /// 対応しない場合、生成されたイベントは `verify` に失敗する。
    pub fn sign(fields: UnsignedEvent, secret_key_hex: &str) -> Result<Event, SigningError> {
        let keypair = Self::parse_keypair(secret_key_hex)?;
        let digest = EventCodec::digest(&fields);
        let message = Message::from_digest(digest);
        let signature = SECP256K1.sign_schnorr(&message, &keypair);

        Ok(fields.into_signed(hex::encode(digest), hex::encode(signature.serialize())))
    }

    /// テンプレートに秘密鍵由来の公開鍵を埋めて署名する
    pub fn sign_template(template: EventTemplate, secret_key_hex: &str) -> Result<Event, SigningError> {
        let pubkey = Self::derive_public_key(secret_key_hex)?;
        let fields = UnsignedEvent {
            pubkey,
            created_at: template.created_at,
            kind: template.kind,
            tags: template.tags,
            content: template.content,
        };
        Self::sign(fields, secret_key_hex)
    }

    /// イベントのIDと署名を検証する
    ///
    /// どのような入力でもパニックせず、失敗はすべて `false` として返す。
    pub fn verify(event: &Event) -> bool {
        Self::check(event).is_ok()
    }

    /// 検証を実行し、失敗理由を返す
    ///
    /// IDの再計算が一致しない場合は署名検証を行わずに失敗する。
    pub fn check(event: &Event) -> Result<(), VerifyFailure> {
        let computed_id = EventCodec::compute_id(&event.unsigned());
        if computed_id != event.id {
            return Err(VerifyFailure::IdMismatch);
        }

        let id_bytes: [u8; 32] = decode_fixed(&event.id).ok_or(VerifyFailure::Malformed("id"))?;
        let pubkey_bytes: [u8; 32] =
            decode_fixed(&event.pubkey).ok_or(VerifyFailure::Malformed("pubkey"))?;
        let sig_bytes: [u8; 64] = decode_fixed(&event.sig).ok_or(VerifyFailure::Malformed("sig"))?;

        let pubkey = XOnlyPublicKey::from_slice(&pubkey_bytes)
            .map_err(|_| VerifyFailure::Malformed("pubkey"))?;
        let signature =
            schnorr::Signature::from_slice(&sig_bytes).map_err(|_| VerifyFailure::Malformed("sig"))?;
        let message = Message::from_digest(id_bytes);

        SECP256K1
            .verify_schnorr(&signature, &message, &pubkey)
            .map_err(|_| VerifyFailure::BadSignature)
    }

    fn parse_keypair(secret_key_hex: &str) -> Result<Keypair, SigningError> {
        let bytes = hex::decode(secret_key_hex.trim())
            .map_err(|e| SigningError::InvalidHex(e.to_string()))?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|e| SigningError::InvalidSecretKey(e.to_string()))?;
        Ok(Keypair::from_secret_key(SECP256K1, &secret_key))
    }
}

/// 16進数文字列を固定長バイト配列にデコード（長さ不一致はNone）
fn decode_fixed<const N: usize>(value: &str) -> Option<[u8; N]> {
    let bytes = hex::decode(value).ok()?;
    bytes.try_into().ok()
}
