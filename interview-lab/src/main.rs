//! The `interview-lab` binary: HTTP service, one-shot generation and schema
//! tooling.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use interview_core::contracts::QuestionRequest;
use interview_core::schema::{check_schemas, export_schemas};
use interview_lab::config::LabConfig;
use interview_lab::errors::LabError;
use interview_lab::server::{serve, AppState};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Starts the HTTP server (default)
    Serve {
        /// Listen address, overriding INTERVIEW_BIND_ADDR
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Generates one question and prints it as JSON
    GenerateQuestion {
        /// ai, backend or frontend
        #[arg(long)]
        track: String,
        /// theory or coding
        #[arg(long)]
        question_type: String,
        /// 1 (easiest) to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        difficulty: u8,
        /// strict or friendly
        #[arg(long)]
        style: Option<String>,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Writes the published contract schemas
    ExportSchemas {
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
    /// Fails when the published contract schemas are out of date
    CheckSchemas {
        #[arg(long, default_value = "schemas")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = LabConfig::from_env()?;

    match cli.command {
        Some(Commands::Serve { addr }) => run_serve(config, addr).await?,
        None => run_serve(config, None).await?,
        Some(Commands::GenerateQuestion {
            track,
            question_type,
            difficulty,
            style,
            pretty,
        }) => {
            let body = json!({
                "track": track,
                "question_type": question_type,
                "difficulty": difficulty,
                "style": style,
            });
            let request = QuestionRequest::from_value(&body).map_err(LabError::from)?;
            let pipeline = AppState::from_config(config).pipeline().await?;
            let question = pipeline.generate_question(&request).await?;
            let text = if pretty {
                serde_json::to_string_pretty(&question)?
            } else {
                serde_json::to_string(&question)?
            };
            println!("{text}");
        }
        Some(Commands::ExportSchemas { out_dir }) => {
            for path in export_schemas(&out_dir)? {
                println!("wrote {}", path.display());
            }
        }
        Some(Commands::CheckSchemas { dir }) => {
            let drifted = check_schemas(&dir)?;
            if !drifted.is_empty() {
                for drift in &drifted {
                    eprintln!("{drift}");
                }
                eprintln!("run `interview-lab export-schemas --out-dir {}`", dir.display());
                return Ok(ExitCode::FAILURE);
            }
            println!("schemas in {} are up to date", dir.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_serve(config: LabConfig, addr: Option<SocketAddr>) -> anyhow::Result<()> {
    let addr = addr.unwrap_or(config.bind_addr);
    serve(addr, AppState::from_config(config))
        .await
        .with_context(|| format!("server on {addr} stopped"))
}
