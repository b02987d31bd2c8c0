//! Vox CLI — entry point.
//!
//! # Commands
//!
//! - `vox chat [-m MESSAGE]` — talk to the assistant (single-shot or REPL)
//! - `vox gateway` — HTTP surface (`POST /command`, `GET /status`)
//! - `vox status` — show configured models, providers, and quota ceilings

mod gateway;
mod helpers;
mod repl;
mod status;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::Value;

use vox_core::config::{load_config, Config};
use vox_models::ModelRegistry;
use vox_orchestrator::{
    ConsoleSpeaker, Dispatcher, Skill, SkillContext, SkillRegistry, SpeechWorker,
};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🎙 Vox — voice-first command router for LLM backends
#[derive(Parser)]
#[command(name = "vox", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the assistant (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Start the HTTP gateway
    Gateway {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration, models, and quota ceilings
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { message, logs } => {
            init_logging(logs);
            run_chat(message).await
        }
        Commands::Gateway { logs } => {
            init_logging(logs);
            gateway::run().await
        }
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>) -> Result<()> {
    let config = load_config(None);
    let (dispatcher, worker) = build_dispatcher(&config, "cli");

    match message {
        Some(msg) => {
            dispatcher.handle_input(&msg).await;
        }
        None => {
            repl::run(&dispatcher).await?;
        }
    }

    dispatcher.shutdown();
    worker.shutdown();
    Ok(())
}

/// Assemble the dispatcher and its speech worker from the loaded config.
pub fn build_dispatcher(config: &Config, user_name: &str) -> (Arc<Dispatcher>, SpeechWorker) {
    let registry = Arc::new(ModelRegistry::from_config(
        &config.models,
        &config.providers,
    ));

    let worker = SpeechWorker::spawn(ConsoleSpeaker::new(&config.assistant.name));

    let mut skills = SkillRegistry::new();
    skills.register(Arc::new(PlaceholderSearchSkill));

    let dispatcher = Dispatcher::new(
        config.assistant.clone(),
        registry,
        config.quota.clone(),
        Arc::new(skills),
        worker.handle(),
        user_name,
    );

    (Arc::new(dispatcher), worker)
}

/// Stand-in for a real search backend: acknowledges the query out loud.
struct PlaceholderSearchSkill;

#[async_trait]
impl Skill for PlaceholderSearchSkill {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for a query."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "What to search for"}
            },
            "required": ["query"]
        })
    }

    async fn invoke(
        &self,
        ctx: &SkillContext,
        args: HashMap<String, Value>,
    ) -> anyhow::Result<bool> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or("that");
        ctx.speech.say(format!(
            "I would search the web for \"{query}\", but no search backend is wired up yet."
        ));
        Ok(true)
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("vox=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
