//! Error types for minish.

use std::io;

/// A line could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no command")]
    NoCommand,
}

/// Command name resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Failures raised by a command handler while it runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("usage: {0}")]
    InvalidArguments(String),

    #[error("environment failure: {0}")]
    EnvironmentFailure(String),

    #[error("filesystem failure: {0}")]
    FilesystemFailure(String),

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("HTTP status {0}")]
    HttpStatusFailure(u16),
}

/// An input line was not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid UTF-8 input (valid up to byte {valid_up_to})")]
pub struct EncodingError {
    /// Number of leading bytes that decoded cleanly.
    pub valid_up_to: usize,
}

impl From<std::str::Utf8Error> for EncodingError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self {
            valid_up_to: e.valid_up_to(),
        }
    }
}

impl From<std::string::FromUtf8Error> for EncodingError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        e.utf8_error().into()
    }
}

/// Errors produced by the minish shell.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("line too long (limit {0} bytes)")]
    LineTooLong(usize),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl ShellError {
    /// Whether the dispatch loop can report this error and keep reading.
    ///
    /// Only failures of the input stream itself end the loop.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
