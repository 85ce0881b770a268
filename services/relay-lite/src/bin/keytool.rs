/// 鍵生成・イベント署名用CLI
///
/// リレーに送信できる署名済みEVENTフレームを作成する。
///
/// ```bash
/// relay-lite-keytool generate
/// relay-lite-keytool pubkey --secret <hex>
/// relay-lite-keytool sign --secret <hex> --kind 1 --tag p,<pubkey> "hello"
/// ```
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use relay_lite::domain::{EventTemplate, SignatureService, SigningError};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "relay-lite-keytool")]
#[command(about = "秘密鍵の生成とイベントへの署名", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 新しい秘密鍵と公開鍵を生成
    Generate,
    /// 秘密鍵からx-only公開鍵を導出
    Pubkey {
        /// 32バイトの秘密鍵（16進数）
        #[arg(long)]
        secret: String,
    },
    /// イベントに署名し、["EVENT", event] フレームを出力
    Sign {
        /// 32バイトの秘密鍵（16進数）
        #[arg(long)]
        secret: String,
        /// イベントのkind
        #[arg(long, default_value_t = 1)]
        kind: u64,
        /// 作成日時（UNIX秒、省略時は現在時刻）
        #[arg(long)]
        created_at: Option<u64>,
        /// タグ（NAME,VALUE,... の形式、複数指定可）
        #[arg(long = "tag", value_name = "NAME,VALUE")]
        tags: Vec<String>,
        /// イベント本文
        content: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<String, SigningError> {
    match command {
        Command::Generate => {
            let secret = SignatureService::generate_key();
            let pubkey = SignatureService::derive_public_key(&secret)?;
            Ok(format!("secret: {}\npubkey: {}", secret, pubkey))
        }
        Command::Pubkey { secret } => SignatureService::derive_public_key(&secret),
        Command::Sign {
            secret,
            kind,
            created_at,
            tags,
            content,
        } => {
            let template = EventTemplate {
                created_at: created_at.unwrap_or_else(now),
                kind,
                tags: tags.iter().map(|tag| parse_tag(tag)).collect(),
                content,
            };
            let event = SignatureService::sign_template(template, &secret)?;
            Ok(json!(["EVENT", event]).to_string())
        }
    }
}

fn parse_tag(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
