//! Command trait, shared environment, and the command registry.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use minish_net::HttpClient;
use minish_types::config::ShellConfig;
use minish_types::error::{HandlerError, RegistryError};
use minish_vfs::Vfs;

use crate::parser::Args;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Command produced no visible output.
    None,
}

/// Future returned by [`Command::execute`]. It owns everything it touches so
/// it can run on its own task.
pub type CommandFuture = BoxFuture<'static, Result<CommandOutput, HandlerError>>;

/// Capabilities and configuration handed to every command invocation.
#[derive(Clone)]
pub struct Environment {
    /// The filesystem.
    pub vfs: Arc<dyn Vfs>,
    /// HTTP client for network commands.
    pub http: Arc<dyn HttpClient>,
    /// Shell configuration.
    pub config: Arc<ShellConfig>,
}

impl Environment {
    pub fn new(vfs: Arc<dyn Vfs>, http: Arc<dyn HttpClient>, config: Arc<ShellConfig>) -> Self {
        Self { vfs, http, config }
    }
}

/// A single executable command.
pub trait Command: Send + Sync {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "ls \[dir\]").
    fn usage(&self) -> &str;

    /// Start the command. The returned future does the actual work.
    fn execute(&self, args: Args, env: Environment) -> CommandFuture;
}

/// Registry of available commands.
///
/// Built once at startup and then shared read-only (behind an `Arc`) with
/// the dispatch loop.
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command under its own name. Replaces any existing command
    /// with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        let name = cmd.name().to_lowercase();
        self.register_as(&name, cmd);
    }

    /// Register a command under an explicit name.
    pub fn register_as(&mut self, name: &str, cmd: Box<dyn Command>) {
        log::debug!("registered command '{name}'");
        self.commands.insert(name.to_lowercase(), Arc::from(cmd));
    }

    /// Look up a command by (already lowercased) name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).map(Arc::clone)
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Built-in help with access to the registry.
    pub fn help(&self, args: &Args) -> Result<CommandOutput, RegistryError> {
        if let Some(name) = args.get(0) {
            let name_lower = name.to_lowercase();
            return match self.commands.get(&name_lower) {
                Some(cmd) => Ok(CommandOutput::Text(format!(
                    "{}\n  {}\n  Usage: {}",
                    name_lower,
                    cmd.description(),
                    cmd.usage()
                ))),
                None if name_lower == "help" => Ok(CommandOutput::Text(
                    "help\n  List available commands\n  Usage: help [command]".to_string(),
                )),
                None => Err(RegistryError::UnknownCommand(name.to_string())),
            };
        }

        let mut out = format!("Commands ({}):\n", self.commands.len() + 1);
        let mut entries: Vec<(&str, &str)> = self
            .commands
            .iter()
            .map(|(name, cmd)| (name.as_str(), cmd.description()))
            .collect();
        entries.push(("help", "List available commands"));
        entries.sort_by_key(|(name, _)| *name);
        for (name, desc) in &entries {
            out.push_str(&format!("  {name:8} {desc}\n"));
        }
        out.push_str("Type 'help <command>' for details.");
        Ok(CommandOutput::Text(out))
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
