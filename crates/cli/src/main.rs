//! Research orchestrator demonstration entry point.
//!
//! Wires concrete adapters (Claude LLM backend, Qdrant vector store,
//! in-process shared memory) and calls `LeadResearcher::research`,
//! printing the serialized `FinalResult` as JSON.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use research_config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(about = "Run the research orchestrator against a single query")]
struct Args {
    /// Natural-language research question
    query: String,

    /// Optional steering objective
    #[arg(long)]
    objective: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env = std::env::var("RESEARCH_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);

    tracing::info!(
        environment = ?settings.environment,
        "Starting research-cli v{}",
        env!("CARGO_PKG_VERSION")
    );

    let result = research_agent::run_demo(&settings, &args.query, args.objective.as_deref()).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("research={}", settings.observability.log_level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
