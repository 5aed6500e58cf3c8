//! CLI entry point: loads `Config`, wires the composition tree (Memory
//! Manager, Tool Registry, agent pool, Flow), and runs a request loop.
//!
//! Subcommands: `serve` (interactive REPL) and `ask <query>` (one-shot).
//! This is a thin driver, not a presentation layer — it exists only so
//! the crate is runnable end-to-end without an external UI.

mod bootstrap;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lawagent", about = "Multi-agent legal consultation runtime")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive stdin/stdout REPL.
    Serve {
        #[arg(long, default_value = "default")]
        session: String,
    },
    /// One-shot question.
    Ask {
        query: String,
        #[arg(long, default_value = "default")]
        session: String,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        subscriber.json().init();
    } else {
        subscriber.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = lawagent_core::Config::from_env().context("failed to load configuration")?;
    init_tracing(config.log_json);
    let flow = bootstrap::build_flow(&config).await.context("failed to initialize runtime")?;

    match cli.command {
        Commands::Serve { session } => cmd_serve(&flow, &session).await,
        Commands::Ask { query, session } => cmd_ask(&flow, &query, &session).await,
    }
}

async fn cmd_ask(flow: &lawagent_flow::Flow, query: &str, session: &str) -> Result<()> {
    let callback: &lawagent_flow::StatusCallback = &|stage: &str, detail: &str, state: &str| {
        info!(stage, detail, state, "status update");
    };
    let response = flow.execute(query, Some(callback), session).await;
    println!("{response}");
    Ok(())
}

async fn cmd_serve(flow: &lawagent_flow::Flow, session: &str) -> Result<()> {
    println!("lawagent 交互式咨询（输入 exit 退出）");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let callback: &lawagent_flow::StatusCallback = &|stage: &str, detail: &str, state: &str| {
            println!("[{stage}] {detail} ({state})");
        };
        let response = flow.execute(line, Some(callback), session).await;
        println!("{response}");
    }

    Ok(())
}
