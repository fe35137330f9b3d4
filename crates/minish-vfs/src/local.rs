//! Host filesystem backend built on `tokio::fs`.

use std::io;
use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;

use crate::{FileWriter, Vfs};

/// The real filesystem of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalVfs;

impl LocalVfs {
    pub fn new() -> Self {
        Self
    }
}

impl Vfs for LocalVfs {
    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn read_dir<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Vec<String>>> {
        Box::pin(read_names(path))
    }

    fn create<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<FileWriter>> {
        Box::pin(create_file(path))
    }
}

async fn read_names(path: &Path) -> io::Result<Vec<String>> {
    let mut dir = tokio::fs::read_dir(path).await?;
    let mut names = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

async fn create_file(path: &Path) -> io::Result<FileWriter> {
    let file = tokio::fs::File::create(path).await?;
    log::debug!("opened {} for writing", path.display());
    Ok(Box::pin(file) as FileWriter)
}
