/// リレーサーバー設定
///
/// 環境変数からリッスンアドレスとイベント保持数を読み込む。
use thiserror::Error;

use crate::infrastructure::event_store::DEFAULT_CAPACITY;

/// デフォルトのバインドホスト
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// デフォルトのポート番号
pub const DEFAULT_PORT: u16 = 4000;

/// リレー設定のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RelayConfigError {
    /// 環境変数の値が不正
    #[error("環境変数 {key} の値が不正です: {value}")]
    InvalidValue { key: String, value: String },
}

/// リレーサーバー設定
///
/// 以下の環境変数から読み込む:
/// - HOST: バインドするホスト（デフォルト: 0.0.0.0）
/// - PORT: リッスンポート（デフォルト: 4000）
/// - MAX_EVENTS: メモリに保持するイベント数の上限（デフォルト: 5000）
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    host: String,
    port: u16,
    max_events: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST.to_string(), DEFAULT_PORT, DEFAULT_CAPACITY)
    }
}

impl RelayConfig {
    /// 環境変数から設定を読み込む
    ///
    /// 未設定・空文字の項目はデフォルト値を使う。
    ///
    /// # エラー
    /// PORT / MAX_EVENTS が正の整数として解釈できない場合
    pub fn from_env() -> Result<Self, RelayConfigError> {
        let host = read_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_positive("PORT", read_var("PORT"), DEFAULT_PORT)?;
        let max_events = parse_positive("MAX_EVENTS", read_var("MAX_EVENTS"), DEFAULT_CAPACITY)?;

        Ok(Self {
            host,
            port,
            max_events,
        })
    }

    /// 明示的な値で設定を作成（テスト用）
    pub fn new(host: String, port: u16, max_events: usize) -> Self {
        Self {
            host,
            port,
            max_events,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// バインドアドレス文字列（host:port）
    ///
    /// IPv6ホストは`[::]:4000`のように角括弧で囲む。
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// 環境変数を読み込む（空文字はNone扱い）
fn read_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 正の整数としてパース（0は不正値）
fn parse_positive<T>(key: &str, value: Option<String>, default: T) -> Result<T, RelayConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let Some(value) = value else {
        return Ok(default);
    };

    match value.parse::<T>() {
        Ok(parsed) if parsed != T::default() => Ok(parsed),
        _ => Err(RelayConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}
