use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use ratedesk_models::config::RatedeskConfig;
use ratedesk_models::message::Conversation;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ratedesk", about = "Supervisor demo routing rate questions to bank agents")]
struct Cli {
    /// Path to configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Question to start the conversation with
    #[arg(short, long, default_value = ratedesk::DEFAULT_REQUEST)]
    message: String,

    /// Override the model for the supervisor and all workers
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ratedesk::load_config(path)?,
        None => RatedeskConfig::default(),
    };
    if let Some(model) = cli.model {
        ratedesk::apply_model_override(&mut config, model);
    }

    let graph = ratedesk::build_graph(&config);
    let stream = graph.stream(Conversation::from_user(cli.message));
    futures::pin_mut!(stream);

    while let Some(event) = stream.next().await {
        let event = event.context("Graph run failed")?;
        info!(step = event.step, node = %event.node, goto = %event.goto, "graph.stream");

        for line in ratedesk::console_lines(&event) {
            println!("{line}");
        }
    }

    Ok(())
}
