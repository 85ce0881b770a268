/// WebSocketメッセージパーサー
///
/// NIP-01のクライアントメッセージ（EVENT, REQ, CLOSE）をパースする
use serde_json::Value;
use thiserror::Error;

use crate::domain::{Filter, RelayMessage};

/// クライアントからリレーへのメッセージ
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// EVENTメッセージ: ["EVENT", <event JSON>]
    ///
    /// イベントの検証はハンドラー側で行うため、生のJSONのまま保持する。
    Event(Value),
    /// REQメッセージ: ["REQ", <subscription_id>, <filter>]
    ///
    /// フィルター省略時（またはnull）は空フィルター。4番目以降の要素は無視する。
    Req {
        subscription_id: String,
        filter: Filter,
    },
    /// CLOSEメッセージ: ["CLOSE", <subscription_id>]
    Close { subscription_id: String },
}

/// メッセージパースエラー
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// JSONパースに失敗
    #[error("invalid json")]
    InvalidJson,
    /// メッセージがJSON配列でない
    #[error("invalid message format")]
    NotArray,
    /// メッセージタイプが文字列でない
    #[error("invalid message format")]
    InvalidMessageType,
    /// 未知のメッセージタイプ
    #[error("unknown type: {0}")]
    UnknownMessageType(String),
    /// 必須フィールドが不足
    #[error("missing required fields")]
    MissingFields,
    /// subscription_idが文字列でない
    #[error("invalid subscription id")]
    InvalidSubscriptionId,
    /// フィルターがオブジェクトでない、またはフィールドの型が不正
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

impl ParseError {
    /// クライアントに返すNOTICEメッセージ
    pub fn to_notice(&self) -> RelayMessage {
        match self {
            ParseError::InvalidJson => RelayMessage::notice_invalid_json(),
            ParseError::NotArray | ParseError::InvalidMessageType => {
                RelayMessage::notice_invalid_format()
            }
            ParseError::UnknownMessageType(t) => RelayMessage::notice_unknown_type(t),
            ParseError::MissingFields => RelayMessage::notice_missing_fields(),
            ParseError::InvalidFilter(detail) => RelayMessage::notice_invalid_filter(detail),
            ParseError::InvalidSubscriptionId => RelayMessage::notice(self.to_string()),
        }
    }
}

/// WebSocketメッセージパーサー
pub struct MessageParser;

impl MessageParser {
    /// WebSocketメッセージをパースしてClientMessageに変換
    ///
    /// # 例
    /// ```
    /// use relay_lite::application::{ClientMessage, MessageParser};
    ///
    /// let result = MessageParser::parse(r#"["CLOSE", "sub1"]"#);
    /// assert_eq!(
    ///     result,
    ///     Ok(ClientMessage::Close { subscription_id: "sub1".to_string() })
    /// );
    /// ```
    pub fn parse(message: &str) -> Result<ClientMessage, ParseError> {
        let value: Value = serde_json::from_str(message).map_err(|_| ParseError::InvalidJson)?;

        let array = value.as_array().ok_or(ParseError::NotArray)?;

        // 最低1要素（メッセージタイプ）が必要
        let Some(first) = array.first() else {
            return Err(ParseError::NotArray);
        };

        let message_type = first.as_str().ok_or(ParseError::InvalidMessageType)?;

        match message_type {
            "EVENT" => Self::parse_event(array),
            "REQ" => Self::parse_req(array),
            "CLOSE" => Self::parse_close(array),
            other => Err(ParseError::UnknownMessageType(other.to_string())),
        }
    }

    /// フォーマット: ["EVENT", <event JSON>]
    ///
    /// イベント欠落時はnullとして渡し、検証側でOK falseとして拒否させる。
    fn parse_event(array: &[Value]) -> Result<ClientMessage, ParseError> {
        let event_json = array.get(1).cloned().unwrap_or(Value::Null);
        Ok(ClientMessage::Event(event_json))
    }

    /// フォーマット: ["REQ", <subscription_id>, <filter>]
    fn parse_req(array: &[Value]) -> Result<ClientMessage, ParseError> {
        let subscription_id = Self::subscription_id(array)?;

        let filter = match array.get(2) {
            None | Some(Value::Null) => Filter::default(),
            Some(value @ Value::Object(_)) => serde_json::from_value(value.clone())
                .map_err(|e| ParseError::InvalidFilter(e.to_string()))?,
            Some(_) => {
                return Err(ParseError::InvalidFilter(
                    "filter must be an object".to_string(),
                ));
            }
        };

        Ok(ClientMessage::Req {
            subscription_id,
            filter,
        })
    }

    /// フォーマット: ["CLOSE", <subscription_id>]
    fn parse_close(array: &[Value]) -> Result<ClientMessage, ParseError> {
        Ok(ClientMessage::Close {
            subscription_id: Self::subscription_id(array)?,
        })
    }

    /// 2番目の要素をsubscription_idとして取り出す（長さ制限なし）
    fn subscription_id(array: &[Value]) -> Result<String, ParseError> {
        array
            .get(1)
            .ok_or(ParseError::MissingFields)?
            .as_str()
            .map(str::to_string)
            .ok_or(ParseError::InvalidSubscriptionId)
    }
}
