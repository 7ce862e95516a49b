mod cli;
mod repl;

use std::{path::Path, sync::Arc};

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use mrp_copilot::{
    agent,
    batch::Batch,
    gateway::{Gateway, SharedStore},
    logging,
    provision::{CancelSignal, Provisioner},
    tools,
};
use serde_json::Value;
use tracing::{debug, info, warn};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.json);

    match cli.command.clone() {
        Some(Command::Tools) => {
            for name in tools::TOOL_NAMES {
                println!("{name}");
            }
            Ok(())
        }
        Some(Command::Provision { batch }) => {
            let rt = tokio::runtime::Runtime::new()?;
            let store = rt.block_on(connect(&cli))?;
            rt.block_on(provision(store, &batch))
        }
        Some(Command::Tool { name, args }) => {
            let rt = tokio::runtime::Runtime::new()?;
            let store = rt.block_on(connect(&cli))?;
            rt.block_on(run_tool(&store, cli.model.as_deref(), &name, &args))
        }
        None => {
            let rt = tokio::runtime::Runtime::new()?;
            let store = rt.block_on(connect(&cli))?;
            let model = cli.model.as_deref();
            let narrator = agent::build_narrator(model)?;
            let copilot = agent::build_copilot(&store, &narrator, model)?;
            eprintln!(
                "Connected to {} as {}. Model: {}. Type /help for commands (Ctrl+D to quit).\n",
                cli.url.as_deref().unwrap_or_default(),
                cli.username.as_deref().unwrap_or_default(),
                model.unwrap_or(agent::DEFAULT_MODEL)
            );
            repl::run(&rt, &copilot, cli.db.as_deref().unwrap_or_default())
        }
    }
}

async fn connect(cli: &Cli) -> anyhow::Result<SharedStore> {
    let config = cli.odoo_config();
    config.validate()?;
    info!(url = %config.url, db = %config.db, login = %config.login, "logging in");
    let gateway = Gateway::connect(&config)
        .await
        .with_context(|| format!("could not log in to {}", config.url))?;
    Ok(Arc::new(gateway))
}

async fn provision(store: SharedStore, path: &Path) -> anyhow::Result<()> {
    let batch = Batch::load(path)?;

    let (cancel_tx, cancel) = CancelSignal::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, abandoning provisioning");
            let _ = cancel_tx.send(true);
        }
    });

    let report = Provisioner::new(store.as_ref())
        .with_cancel(cancel)
        .run(&batch)
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_tool(store: &SharedStore, model: Option<&str>, name: &str, raw_args: &str) -> anyhow::Result<()> {
    let args: Value = serde_json::from_str(raw_args).context("--args must be a JSON object")?;
    let narrator = agent::build_narrator(model)
        .map_err(|e| debug!(error = %e, "narration disabled"))
        .ok();
    let output = tools::invoke(store, narrator.as_ref(), name, args).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
