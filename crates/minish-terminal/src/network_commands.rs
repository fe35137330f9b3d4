//! Network commands: wget.

use std::io;
use std::path::Path;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use minish_types::error::HandlerError;

use crate::interpreter::{Command, CommandFuture, CommandOutput, CommandRegistry, Environment};
use crate::parser::Args;

const WGET_USAGE: &str = "wget <url> [file]";

/// Register network commands into a registry.
pub fn register_network_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(WgetCmd));
}

// ---------------------------------------------------------------------------
// wget (stream an HTTP GET response into a file)
// ---------------------------------------------------------------------------

/// Lifecycle of a single download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Request sent or body still arriving.
    InFlight,
    /// Body fully written and the file closed.
    Complete,
    /// Aborted by a network, HTTP, or filesystem error.
    Failed,
}

/// One `wget` invocation: where from, where to, and how far it got.
#[derive(Debug)]
pub struct DownloadTask {
    url: String,
    destination: String,
    state: DownloadState,
    written: u64,
}

fn fs_failure(path: &str, e: io::Error) -> HandlerError {
    HandlerError::FilesystemFailure(format!("{path}: {e}"))
}

impl DownloadTask {
    pub fn new(url: &str, destination: &str) -> Self {
        Self {
            url: url.to_string(),
            destination: destination.to_string(),
            state: DownloadState::InFlight,
            written: 0,
        }
    }

    pub fn state(&self) -> DownloadState {
        self.state
    }

    /// Bytes written to the destination so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Fetch the URL and stream the body into the destination file.
    pub async fn run(&mut self, env: &Environment) -> Result<u64, HandlerError> {
        let result = self.transfer(env).await;
        self.state = match result {
            Ok(_) => DownloadState::Complete,
            Err(_) => DownloadState::Failed,
        };
        result
    }

    async fn transfer(&mut self, env: &Environment) -> Result<u64, HandlerError> {
        let resp = env.http.get(&self.url).await?;
        if !resp.is_success() {
            return Err(HandlerError::HttpStatusFailure(resp.status));
        }

        // The file is only created once the server has answered with a
        // success status.
        let mut writer = env
            .vfs
            .create(Path::new(&self.destination))
            .await
            .map_err(|e| fs_failure(&self.destination, e))?;

        // Pull one chunk, write it, then pull the next: a slow disk slows
        // the download instead of buffering the body in memory.
        let mut body = resp.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| fs_failure(&self.destination, e))?;
            self.written += chunk.len() as u64;
            log::debug!("{}: {} bytes written", self.destination, self.written);
        }
        writer
            .shutdown()
            .await
            .map_err(|e| fs_failure(&self.destination, e))?;
        Ok(self.written)
    }
}

struct WgetCmd;
impl Command for WgetCmd {
    fn name(&self) -> &str {
        "wget"
    }
    fn description(&self) -> &str {
        "Download a URL to a file"
    }
    fn usage(&self) -> &str {
        WGET_USAGE
    }
    fn execute(&self, args: Args, env: Environment) -> CommandFuture {
        Box::pin(wget(args, env))
    }
}

async fn wget(args: Args, env: Environment) -> Result<CommandOutput, HandlerError> {
    let Some(url) = args.get(0) else {
        return Err(HandlerError::InvalidArguments(WGET_USAGE.to_string()));
    };
    let destination = args.get_or(1, &env.config.download.default_file);

    let mut task = DownloadTask::new(url, destination);
    let bytes = task.run(&env).await?;
    log::info!("{url}: {bytes} bytes saved to '{destination}'");
    Ok(CommandOutput::Text(format!(
        "{url} downloaded to file '{destination}'"
    )))
}
