use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use marg_server::{MarginaliaServer, ServerConfig};
use marg_store::{Commit, DirectoryStore, RepositoryMeta, VersionedStore};
use marg_types::{timestamp, Identity};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Setup(args) => cmd_setup(args),
        Command::Run(args) => cmd_run(args),
        Command::Log(args) => cmd_log(args, &cli.format),
    }
}

fn cmd_setup(args: SetupArgs) -> anyhow::Result<()> {
    let name = args.name.unwrap_or_else(|| default_name(&args.directory));
    let store = DirectoryStore::init(&args.directory, RepositoryMeta::annotations(name), &Identity::default())
        .with_context(|| format!("cannot set up repository in {}", args.directory.display()))?;
    let meta = store.meta();
    println!(
        "{} Initialized annotation repository {} in {}",
        "✓".green().bold(),
        meta.name.bold(),
        args.directory.display()
    );
    println!("  Schema: {}", meta.schema.cyan());
    println!("  Branch: {}", meta.default_branch.yellow());
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let config = config.with_bind_addr(resolve(&args.host, args.port)?);
    let store = DirectoryStore::open(&args.directory)
        .with_context(|| format!("cannot open repository in {}", args.directory.display()))?;
    let server = MarginaliaServer::new(config, Arc::new(store));

    println!(
        "{} Serving {} on http://{}",
        "▶".green().bold(),
        args.directory.display(),
        server.config().bind_addr.to_string().bold()
    );
    let runtime = tokio::runtime::Runtime::new().context("cannot start async runtime")?;
    runtime.block_on(server.serve_with_shutdown(shutdown_signal()))?;
    Ok(())
}

fn cmd_log(args: LogArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = DirectoryStore::open(&args.directory)
        .with_context(|| format!("cannot open repository in {}", args.directory.display()))?;
    let branch = args
        .branch
        .unwrap_or_else(|| store.meta().default_branch.clone());
    let commits = store.history(&branch, args.limit)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&commits)?),
        OutputFormat::Text => {
            for commit in &commits {
                println!("{}", render_commit(commit));
            }
        }
    }
    Ok(())
}

fn render_commit(commit: &Commit) -> String {
    format!(
        "{} {} {}  {}",
        commit.id.short_hex().yellow(),
        timestamp::format(&commit.committer.when).dimmed(),
        commit.committer.identity.to_string().cyan(),
        commit.message
    )
}

fn default_name(directory: &Path) -> String {
    directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "marginalia".into())
}

fn resolve(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .with_context(|| format!("cannot resolve {host}:{port}"))?
        .next()
        .with_context(|| format!("no address for {host}:{port}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
