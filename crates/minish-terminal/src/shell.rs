//! The dispatch loop.
//!
//! Reads lines, parses and resolves them, and spawns each command on its own
//! task. The loop goes straight back to reading, so a long `wget` never
//! delays the next command. Output travels back over a channel as
//! [`ConsoleLine`]s; the binary prints them, tests collect them.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;

use minish_types::error::{RegistryError, Result, ShellError};

use crate::interpreter::{CommandOutput, CommandRegistry, Environment};
use crate::line_reader::LineReader;
use crate::parser;

/// Prefix for diagnostics that don't belong to a particular command.
const SHELL_NAME: &str = "minish";

/// One line of console output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Stdout(String),
    Stderr(String),
}

/// Where the dispatch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Between lines.
    Idle,
    /// Waiting for the next input line.
    Reading,
    /// Parsing, resolving and spawning one line.
    Dispatching,
}

/// Interactive shell: owns the dispatch loop and the in-flight commands.
pub struct Shell {
    registry: Arc<CommandRegistry>,
    env: Environment,
    console: UnboundedSender<ConsoleLine>,
    tasks: JoinSet<()>,
    state: DispatchState,
}

fn send_output(console: &UnboundedSender<ConsoleLine>, output: CommandOutput) {
    match output {
        CommandOutput::Text(text) => {
            for line in text.lines() {
                // A closed console only means nobody is listening any more.
                let _ = console.send(ConsoleLine::Stdout(line.to_string()));
            }
        },
        CommandOutput::None => {},
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

impl Shell {
    pub fn new(
        registry: Arc<CommandRegistry>,
        env: Environment,
        console: UnboundedSender<ConsoleLine>,
    ) -> Self {
        Self {
            registry,
            env,
            console,
            tasks: JoinSet::new(),
            state: DispatchState::Idle,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Number of spawned commands that have not been reaped yet.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Read and dispatch lines until `input` is exhausted, then wait for
    /// the commands still running.
    ///
    /// Per-line errors are reported on the console and the loop carries on;
    /// only an I/O error on `input` itself ends it early.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, input: R) -> Result<()> {
        let mut reader = LineReader::new(input, self.env.config.input.max_line_len);
        let result = loop {
            self.reap();
            self.state = DispatchState::Reading;
            match reader.next_line().await {
                Ok(Some(line)) => self.dispatch(&line),
                Ok(None) => break Ok(()),
                Err(e) if e.is_recoverable() => self.report(SHELL_NAME, &e),
                Err(e) => {
                    log::error!("input stream failed: {e}");
                    break Err(e);
                },
            }
            self.state = DispatchState::Idle;
        };
        self.state = DispatchState::Idle;
        log::debug!("input closed, waiting for {} command(s)", self.tasks.len());
        self.wait_idle().await;
        result
    }

    /// Parse, resolve and spawn one input line. Returns without waiting for
    /// the command to finish.
    pub fn dispatch(&mut self, line: &str) {
        self.state = DispatchState::Dispatching;
        self.dispatch_line(line);
        self.state = DispatchState::Idle;
    }

    fn dispatch_line(&mut self, line: &str) {
        let cmd = match parser::parse(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                self.report(SHELL_NAME, &ShellError::from(e));
                return;
            },
        };

        let Some(handler) = self.registry.resolve(&cmd.name) else {
            // The built-in `help` needs the registry itself and does no I/O.
            // A registered `help` takes precedence.
            if cmd.name == "help" {
                match self.registry.help(&cmd.args) {
                    Ok(output) => send_output(&self.console, output),
                    Err(e) => self.report("help", &ShellError::from(e)),
                }
                return;
            }
            let err = ShellError::from(RegistryError::UnknownCommand(cmd.name));
            self.report(SHELL_NAME, &err);
            return;
        };

        log::debug!("dispatching '{}' with {} arg(s)", cmd.name, cmd.args.len());
        let fut = handler.execute(cmd.args, self.env.clone());
        let console = self.console.clone();
        let name = cmd.name;
        self.tasks.spawn(async move {
            // A panic is reported from inside the task so the diagnostic
            // shows up while the loop is still blocked on input.
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(output)) => send_output(&console, output),
                Ok(Err(e)) => {
                    log::warn!("{name}: {e}");
                    let _ = console.send(ConsoleLine::Stderr(format!("{name}: {e}")));
                },
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    log::error!("{name} panicked: {msg}");
                    let _ = console.send(ConsoleLine::Stderr(format!(
                        "{SHELL_NAME}: command aborted: {name} panicked: {msg}"
                    )));
                },
            }
        });
    }

    /// Wait for every in-flight command to finish.
    pub async fn wait_idle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            self.check_join(joined);
        }
    }

    /// Collect commands that have already finished.
    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            self.check_join(joined);
        }
    }

    fn check_join(&self, joined: std::result::Result<(), tokio::task::JoinError>) {
        if let Err(e) = joined {
            log::error!("command task failed: {e}");
            let _ = self
                .console
                .send(ConsoleLine::Stderr(format!("{SHELL_NAME}: command aborted: {e}")));
        }
    }

    fn report(&self, source: &str, err: &ShellError) {
        log::debug!("{source}: {err}");
        let _ = self
            .console
            .send(ConsoleLine::Stderr(format!("{source}: {err}")));
    }
}
