//! Trendscope CLI entry point.
//!
//! Provides `parse`, `event`, `prompt` and `merge` subcommands for running
//! the query pipeline on text, on a Slack payload, inspecting the secondary
//! parse request, or replaying a saved secondary response.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, warn};

use trendscope::adapters::slack;
use trendscope::config::{self, Config};
use trendscope::credentials;
use trendscope::escalation::ParseRequest;
use trendscope::logging::{self, LoggingGuard};
use trendscope::merger;
use trendscope::pipeline::{LlmSecondaryParser, QueryPipeline, SecondaryParser};
use trendscope::providers;

/// Trendscope — parse entertainment-IP trend questions into structured intents.
#[derive(Parser)]
#[command(name = "trendscope", version, about)]
struct Cli {
    /// Config file (default: ~/.trendscope/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Parse a question and print the intent as JSON.
    Parse {
        /// Question text.
        text: String,
        /// Never call the secondary parser.
        #[arg(long)]
        offline: bool,
    },
    /// Adapt a Slack payload, parse its text and print both.
    Event {
        /// Payload file, or `-` for stdin.
        path: String,
    },
    /// Print the secondary parse request built for a question.
    Prompt {
        /// Question text.
        text: String,
    },
    /// Merge a saved secondary response into the rule-based parse.
    Merge {
        /// Question text.
        text: String,
        /// Response file, or `-` for stdin.
        response: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;
    let _logging_guard = init_logging(&config)?;

    match cli.command {
        Command::Parse { text, offline } => handle_parse(&config, &text, offline).await,
        Command::Event { path } => handle_event(&config, &path).await,
        Command::Prompt { text } => handle_prompt(&text),
        Command::Merge { text, response } => handle_merge(&text, &response),
    }
}

fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    match explicit {
        Some(path) => config::load_config(path),
        None => {
            let paths = config::runtime_paths()?;
            config::load_config_or_default(&paths.config_toml)
                .with_context(|| format!("failed to load {}", paths.config_toml.display()))
        }
    }
}

fn init_logging(config: &Config) -> anyhow::Result<Option<LoggingGuard>> {
    match &config.logging.dir {
        Some(dir) => Ok(Some(logging::init_production(dir, &config.logging.level)?)),
        None => {
            logging::init_cli(&config.logging.level);
            Ok(None)
        }
    }
}

/// Build the secondary parser, or `None` when disabled or unconfigured.
fn secondary_parser(config: &Config) -> Option<Arc<dyn SecondaryParser>> {
    if !config.parser.enabled {
        debug!("secondary parser disabled in config");
        return None;
    }
    let credentials = match config::runtime_paths()
        .and_then(|paths| credentials::load_with_env(&paths.env_file))
    {
        Ok(credentials) => credentials,
        Err(e) => {
            warn!(error = %e, "failed to load credentials, running rule-based only");
            return None;
        }
    };
    match providers::build_provider(&config.parser, &credentials) {
        Ok(provider) => Some(Arc::new(LlmSecondaryParser::new(
            provider,
            config.parser.max_tokens,
        ))),
        Err(e) => {
            warn!(error = %e, "secondary parser unavailable, running rule-based only");
            None
        }
    }
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

async fn handle_parse(config: &Config, text: &str, offline: bool) -> anyhow::Result<()> {
    let pipeline = QueryPipeline::new();
    let parser = if offline {
        None
    } else {
        secondary_parser(config)
    };
    let intent = pipeline
        .resolve(text, parser.as_deref(), config.parser.timeout())
        .await;
    print_json(&intent)
}

async fn handle_event(config: &Config, path: &str) -> anyhow::Result<()> {
    let payload = read_input(path)?;
    let query = slack::parse_payload_str(&payload).context("failed to adapt payload")?;
    let pipeline = QueryPipeline::new();
    let parser = secondary_parser(config);
    let intent = pipeline
        .resolve(&query.text, parser.as_deref(), config.parser.timeout())
        .await;
    print_json(&json!({ "query": query, "intent": intent }))
}

fn handle_prompt(text: &str) -> anyhow::Result<()> {
    let request = ParseRequest::for_text(text.trim());
    print_json(&json!({ "system": request.system, "user": request.user }))
}

fn handle_merge(text: &str, response_path: &str) -> anyhow::Result<()> {
    let response = read_input(response_path)?;
    let rule = QueryPipeline::new().parse(text);
    let merged = merger::merge(&rule, &response);
    print_json(&json!({
        "intent": merged.intent,
        "diagnostic": merged.diagnostic.map(|d| d.to_string()),
    }))
}
