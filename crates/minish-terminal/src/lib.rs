//! Command interpreter and dispatch loop.
//!
//! The terminal is a registry-based dispatch system. Commands implement the
//! `Command` trait and are registered by name. The shell reads input lines,
//! parses them, resolves the command name, and spawns `execute()` as its own
//! task so slow commands never hold up the next line.

mod commands;
mod interpreter;
pub mod line_reader;
pub mod network_commands;
pub mod parser;
mod shell;
#[cfg(test)]
mod test_utils;

/// Register all built-in commands (pwd, ls, wget) into a registry.
pub use commands::register_builtins;
/// A single executable command trait.
pub use interpreter::Command;
/// Boxed future returned by `Command::execute`.
pub use interpreter::CommandFuture;
/// Output produced by a command.
pub use interpreter::CommandOutput;
/// Registry of available commands.
pub use interpreter::CommandRegistry;
/// Capabilities and configuration shared by every command.
pub use interpreter::Environment;
/// Newline-delimited, UTF-8 decoding input reader.
pub use line_reader::LineReader;
/// Register network commands (wget) into a registry.
pub use network_commands::register_network_commands;
/// Parsed command arguments.
pub use parser::Args;
/// Command name plus arguments.
pub use parser::ParsedCommand;
/// A line of console output.
pub use shell::ConsoleLine;
/// Dispatch loop state.
pub use shell::DispatchState;
/// The dispatch loop.
pub use shell::Shell;
