//! minish entry point.
//!
//! Reads commands from stdin and prints their output as each one finishes.
//! Commands run concurrently, so a long download never holds up the prompt.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use minish_net::ReqwestClient;
use minish_terminal::{CommandRegistry, ConsoleLine, Environment, Shell, register_builtins};
use minish_types::config::{CONFIG_ENV_VAR, ShellConfig};
use minish_vfs::LocalVfs;

const DEFAULT_CONFIG_FILE: &str = "minish.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Resolve config from CLI arg, MINISH_CONFIG env var, or the default file.
    let config_path: PathBuf = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
        .into();
    let config = ShellConfig::load(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log.level.as_str()),
    )
    .init();
    log::info!("Starting minish (config: {})", config_path.display());

    let http = ReqwestClient::new(&config.http)?;

    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry);
    log::debug!("{} commands registered", registry.len());

    let env = Environment::new(Arc::new(LocalVfs::new()), Arc::new(http), Arc::new(config));

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_console(rx));

    let mut shell = Shell::new(Arc::new(registry), env, tx);
    let result = shell.run(tokio::io::stdin()).await;

    // Dropping the shell closes the channel so the printer can drain and exit.
    drop(shell);
    printer.await??;
    result?;

    log::info!("minish exiting");
    Ok(())
}

/// Print console lines in arrival order until every sender is gone.
async fn print_console(mut rx: UnboundedReceiver<ConsoleLine>) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    while let Some(line) = rx.recv().await {
        match line {
            ConsoleLine::Stdout(text) => write_line(&mut stdout, &text).await?,
            ConsoleLine::Stderr(text) => write_line(&mut stderr, &text).await?,
        }
    }
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
