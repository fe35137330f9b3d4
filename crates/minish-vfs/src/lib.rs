//! Filesystem capability consumed by minish command handlers.
//!
//! Handlers never touch `std::fs` or `tokio::fs` directly. They go through
//! the [`Vfs`] trait so tests can substitute [`MemoryVfs`] for the real
//! filesystem ([`LocalVfs`]).

mod local;
mod memory;

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use futures_util::future::BoxFuture;
use tokio::io::AsyncWrite;

pub use local::LocalVfs;
pub use memory::MemoryVfs;

/// A writable file handle returned by [`Vfs::create`].
pub type FileWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Asynchronous filesystem operations used by the built-in commands.
pub trait Vfs: Send + Sync {
    /// The directory relative paths are resolved against.
    fn current_dir(&self) -> io::Result<PathBuf>;

    /// Names of the entries in `path`, in whatever order the backend
    /// yields them.
    fn read_dir<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Vec<String>>>;

    /// Create `path` for writing, truncating any existing file.
    fn create<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<FileWriter>>;
}
