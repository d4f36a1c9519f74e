//! 인증 운영자 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 서명 키 생성
//! review keygen
//!
//! # 토큰 발급 (REVIEW__AUTH__SIGNING_KEY 필요)
//! review issue --subject ash --roles USER,ADMIN --ttl-secs 600
//!
//! # 토큰 검증
//! review inspect eyJhbGciOiJIUzUxMiJ9...
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use review_cli::commands::{
    configured_key,
    inspect::{inspect_token, OutputFormat},
    issue::{issue_token, IssueConfig},
    keygen::{key_hint, run_keygen},
};
use review_core::{init_logging, AppConfig, LoggingConfig};

#[derive(Parser)]
#[command(name = "review")]
#[command(about = "Review API 인증 운영 도구", long_about = None)]
#[command(version)]
struct Cli {
    /// 서명 키 (base64). 없으면 설정의 auth.signing_key 사용
    #[arg(long, global = true, env = "REVIEW_SIGNING_KEY", hide_env_values = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 512비트 서명 키 생성
    Keygen,

    /// 설정된 키로 토큰 발급
    Issue {
        /// 토큰 subject (사용자 이름)
        #[arg(short, long)]
        subject: String,

        /// 쉼표로 구분된 역할 (예: USER,ADMIN)
        #[arg(short, long, default_value = "USER")]
        roles: String,

        /// 유효 기간 (초, 기본: 설정의 auth.token_ttl_secs)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },

    /// 토큰 검증 및 클레임 출력
    Inspect {
        /// 검증할 토큰
        token: String,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Commands::Keygen = cli.command {
        println!("{}", key_hint());
        println!("{}", run_keygen());
        return Ok(());
    }

    let config = AppConfig::load_default().context("failed to load configuration")?;
    init_logging(&LoggingConfig {
        level: "warn".to_string(),
        ..config.logging.clone()
    })?;
    let key = configured_key(cli.key.as_deref(), config.auth.signing_key.as_deref())?;

    match cli.command {
        Commands::Keygen => {}

        Commands::Issue {
            subject,
            roles,
            ttl_secs,
        } => {
            let issue = IssueConfig {
                subject,
                roles,
                ttl_secs: ttl_secs.unwrap_or(config.auth.token_ttl_secs),
            };
            debug!(subject = %issue.subject, ttl_secs = issue.ttl_secs, "Issuing token");
            println!("{}", issue_token(&key, &issue)?);
        }

        Commands::Inspect { token, format } => {
            let format = OutputFormat::parse(&format)?;
            let summary = inspect_token(&key, &token)?;
            println!("{}", summary.render(format)?);
        }
    }

    Ok(())
}
