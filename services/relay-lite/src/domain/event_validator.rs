/// EVENTメッセージで受信したイベントのバリデーション
///
/// バリデーション順序: 必須フィールド(id, sig) -> 構造 -> ID再計算 -> 署名
use serde_json::Value;
use thiserror::Error;

use crate::domain::Event;
use crate::domain::signature::{SignatureService, VerifyFailure};

/// イベント受付時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// id または sig が欠落（文字列でない、空文字列を含む）
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// フィールドの型・形状が不正でEventとして解釈できない
    #[error("malformed event: {0}")]
    Malformed(String),
    /// IDの再計算または署名検証に失敗
    #[error("verification failed: {0}")]
    VerificationFailed(VerifyFailure),
}

impl ValidationError {
    /// OKメッセージに載せる理由文字列
    ///
    /// 必須フィールド欠落は "invalid event"、それ以外は "invalid"。
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "invalid event",
            ValidationError::Malformed(_) | ValidationError::VerificationFailed(_) => "invalid",
        }
    }
}

/// NIP-01イベントバリデータ
pub struct EventValidator;

impl EventValidator {
    /// OKメッセージ用にイベントIDを取り出す（取れなければ空文字列）
    pub fn event_id_hint(event_json: &Value) -> String {
        event_json
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// id と sig が空でない文字列として存在するかをチェック
    pub fn validate_required(event_json: &Value) -> Result<(), ValidationError> {
        for field in ["id", "sig"] {
            let present = event_json
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());
            if !present {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }

    /// すべてのバリデーションを実行してEventにパース
    pub fn validate_all(event_json: &Value) -> Result<Event, ValidationError> {
        Self::validate_required(event_json)?;

        let event: Event = serde_json::from_value(event_json.clone())
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;

        SignatureService::check(&event).map_err(ValidationError::VerificationFailed)?;

        Ok(event)
    }
}
