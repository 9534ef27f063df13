pub mod cli;
pub mod config;
pub mod controller;
pub mod datastore;
pub mod draft;
pub mod filter;
pub mod render;
pub mod repository;
pub mod shell;
pub mod task;
pub mod view;

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use crate::controller::ViewController;
use crate::datastore::{Latency, MemoryListStore, MemoryTaskStore, Seed};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting taskflow"
    );

    let mut cfg = config::Config::load(cli.taskflowrc.as_deref())?;
    cfg.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    );

    let latency = if cli.no_latency {
        Latency::none()
    } else {
        cfg.latency().context("failed to read latency settings")?
    };
    debug!(?latency, "store latency");

    let seed = match cli.seed.or_else(|| cfg.seed_path()) {
        Some(path) => Seed::load(&path)
            .with_context(|| format!("failed to load seed {}", path.display()))?,
        None => Seed::builtin(),
    };

    let tasks = Arc::new(MemoryTaskStore::new(seed.tasks, latency));
    let lists = Arc::new(MemoryListStore::new(seed.lists, latency));
    let controller = ViewController::new(tasks, lists, Arc::new(shell::StdinConfirm));
    let renderer = render::Renderer::new(&cfg);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start async runtime")?;

    let mut out = io::stdout();
    runtime.block_on(async {
        shell::Shell::new(&controller, renderer)
            .run(shell::stdin_lines(), &mut out)
            .await
    })?;

    info!("done");
    Ok(())
}
