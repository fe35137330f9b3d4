//! Built-in filesystem commands.

use std::path::PathBuf;

use minish_types::error::HandlerError;

use crate::interpreter::{Command, CommandFuture, CommandOutput, CommandRegistry, Environment};
use crate::parser::Args;

/// Register all built-in commands into a registry.
///
/// `help` is not registered here; the shell answers it directly from the
/// registry.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(LsCmd));
    crate::register_network_commands(reg);
}

// ---------------------------------------------------------------------------
// pwd
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn execute(&self, _args: Args, env: Environment) -> CommandFuture {
        Box::pin(pwd(env))
    }
}

async fn pwd(env: Environment) -> Result<CommandOutput, HandlerError> {
    let cwd = env
        .vfs
        .current_dir()
        .map_err(|e| HandlerError::EnvironmentFailure(e.to_string()))?;
    Ok(CommandOutput::Text(cwd.display().to_string()))
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [dir]"
    }
    fn execute(&self, args: Args, env: Environment) -> CommandFuture {
        Box::pin(ls(args, env))
    }
}

async fn ls(args: Args, env: Environment) -> Result<CommandOutput, HandlerError> {
    let target = match args.get(0).filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => env
            .vfs
            .current_dir()
            .map_err(|e| HandlerError::EnvironmentFailure(e.to_string()))?,
    };
    // Entries are printed in whatever order the filesystem yields.
    let names = env
        .vfs
        .read_dir(&target)
        .await
        .map_err(|e| HandlerError::FilesystemFailure(format!("{}: {e}", target.display())))?;
    if names.is_empty() {
        return Ok(CommandOutput::None);
    }
    Ok(CommandOutput::Text(names.join("\n")))
}
