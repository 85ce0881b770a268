/// NIP-01リレーサーバーのエントリポイント
///
/// # 環境変数
/// - HOST: バインドアドレス（デフォルト: 0.0.0.0）
/// - PORT: ポート番号（デフォルト: 4000）
/// - MAX_EVENTS: イベントストアの容量（デフォルト: 5000）
/// - RELAY_NAME / RELAY_DESCRIPTION / RELAY_PUBKEY / RELAY_CONTACT: リレー情報
/// - RUST_LOG: ログレベル（デフォルト: info）
use std::process::ExitCode;

use relay_lite::infrastructure::{RelayConfig, RelayInfoConfig, init_logging, serve};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // 構造化ログを初期化
    init_logging();

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "設定の読み込みに失敗しました");
            return ExitCode::FAILURE;
        }
    };
    let relay_info = RelayInfoConfig::from_env();

    info!(
        name = %relay_info.name,
        version = env!("CARGO_PKG_VERSION"),
        "リレーサーバーを起動します"
    );

    if let Err(e) = serve(config, relay_info).await {
        error!(error = %e, "サーバーが異常終了しました");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
