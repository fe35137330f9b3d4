//! In-memory VFS implementation.
//!
//! Useful for unit tests. The whole tree lives in a `BTreeMap<String, Node>`
//! keyed by normalized absolute paths and shared with every open
//! [`FileWriter`], so bytes become visible as soon as they are written.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use tokio::io::AsyncWrite;

use crate::{FileWriter, Vfs};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

type Nodes = Arc<Mutex<BTreeMap<String, Node>>>;

fn lock(nodes: &Nodes) -> MutexGuard<'_, BTreeMap<String, Node>> {
    nodes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A fully in-memory file tree with its own working directory.
#[derive(Debug, Clone)]
pub struct MemoryVfs {
    nodes: Nodes,
    cwd: String,
}

impl MemoryVfs {
    /// Create a VFS containing only `/`, with `/` as the working directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self {
            nodes: Arc::new(Mutex::new(nodes)),
            cwd: "/".to_string(),
        }
    }

    /// Set the working directory (created if missing).
    pub fn with_cwd(mut self, cwd: &str) -> Self {
        let cwd = normalize("/", cwd);
        self.mkdir(&cwd);
        self.cwd = cwd;
        self
    }

    /// Create a directory and any missing parents.
    pub fn mkdir(&self, path: &str) {
        let path = normalize(&self.cwd, path);
        let mut nodes = lock(&self.nodes);
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            nodes.entry(current.clone()).or_insert(Node::Dir);
        }
    }

    /// Write a whole file. Parent directories are created as needed.
    pub fn write(&self, path: &str, data: &[u8]) {
        let path = normalize(&self.cwd, path);
        self.mkdir(parent(&path));
        lock(&self.nodes).insert(path, Node::File(data.to_vec()));
    }

    /// Contents of a file, if it exists.
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        let path = normalize(&self.cwd, path);
        match lock(&self.nodes).get(&path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// Current length of a file, if it exists.
    pub fn file_len(&self, path: &str) -> Option<usize> {
        let path = normalize(&self.cwd, path);
        match lock(&self.nodes).get(&path) {
            Some(Node::File(data)) => Some(data.len()),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        let path = normalize(&self.cwd, path);
        lock(&self.nodes).contains_key(&path)
    }

    fn resolve(&self, path: &Path) -> String {
        normalize(&self.cwd, &path.to_string_lossy())
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `path` against `cwd` into an absolute path without `.`, `..`,
/// repeated or trailing slashes.
fn normalize(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{cwd}/{path}")
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            p => parts.push(p),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Return the parent of a normalized path.
fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

fn not_found(what: &str, path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{what}: {path}"))
}

impl Vfs for MemoryVfs {
    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(PathBuf::from(&self.cwd))
    }

    fn read_dir<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Vec<String>>> {
        let path = self.resolve(path);
        Box::pin(async move {
            let nodes = lock(&self.nodes);
            match nodes.get(&path) {
                Some(Node::Dir) => {},
                Some(Node::File(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotADirectory,
                        format!("not a directory: {path}"),
                    ));
                },
                None => return Err(not_found("no such directory", &path)),
            }

            let prefix = if path == "/" {
                path.clone()
            } else {
                format!("{path}/")
            };
            let mut names = Vec::new();
            for key in nodes.range(prefix.clone()..).map(|(k, _)| k) {
                if !key.starts_with(&prefix) {
                    break;
                }
                // Direct children only.
                let rest = &key[prefix.len()..];
                if !rest.is_empty() && !rest.contains('/') {
                    names.push(rest.to_string());
                }
            }
            Ok(names)
        })
    }

    fn create<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<FileWriter>> {
        let path = self.resolve(path);
        Box::pin(async move {
            {
                let mut nodes = lock(&self.nodes);
                let par = parent(&path);
                if !matches!(nodes.get(par), Some(Node::Dir)) {
                    return Err(not_found("parent directory does not exist", par));
                }
                if matches!(nodes.get(&path), Some(Node::Dir)) {
                    return Err(io::Error::new(
                        io::ErrorKind::IsADirectory,
                        format!("is a directory: {path}"),
                    ));
                }
                nodes.insert(path.clone(), Node::File(Vec::new()));
            }
            Ok(Box::pin(MemoryFile {
                nodes: Arc::clone(&self.nodes),
                path,
            }) as FileWriter)
        })
    }
}

/// Writer that appends into a file node of a [`MemoryVfs`].
struct MemoryFile {
    nodes: Nodes,
    path: String,
}

impl AsyncWrite for MemoryFile {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut nodes = lock(&self.nodes);
        match nodes.get_mut(&self.path) {
            Some(Node::File(data)) => {
                data.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            },
            _ => Poll::Ready(Err(not_found("file removed while open", &self.path))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[test]
    fn normalize_paths() {
        assert_eq!(normalize("/", "/"), "/");
        assert_eq!(normalize("/home", "docs"), "/home/docs");
        assert_eq!(normalize("/home", "//a//b/"), "/a/b");
        assert_eq!(normalize("/home/user", ".."), "/home");
        assert_eq!(normalize("/", "../.."), "/");
        assert_eq!(normalize("/a", "./b/./c"), "/a/b/c");
    }

    #[test]
    fn parent_of_paths() {
        assert_eq!(parent("/"), "/");
        assert_eq!(parent("/a"), "/");
        assert_eq!(parent("/a/b"), "/a");
    }

    #[tokio::test]
    async fn read_dir_lists_direct_children() {
        let vfs = MemoryVfs::new();
        vfs.mkdir("/home/user");
        vfs.write("/home/notes.txt", b"hi");
        let names = vfs.read_dir(Path::new("/home")).await.unwrap();
        assert_eq!(names, vec!["notes.txt".to_string(), "user".to_string()]);
    }

    #[tokio::test]
    async fn read_dir_relative_to_cwd() {
        let vfs = MemoryVfs::new().with_cwd("/work");
        vfs.write("/work/sub/a", b"");
        let names = vfs.read_dir(Path::new("sub")).await.unwrap();
        assert_eq!(names, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn read_dir_missing_is_not_found() {
        let vfs = MemoryVfs::new();
        let err = vfs.read_dir(Path::new("/nope")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn read_dir_on_file_fails() {
        let vfs = MemoryVfs::new();
        vfs.write("/file", b"data");
        assert!(vfs.read_dir(Path::new("/file")).await.is_err());
    }

    #[tokio::test]
    async fn create_and_stream_writes() {
        let vfs = MemoryVfs::new().with_cwd("/tmp");
        let mut w = vfs.create(Path::new("out.bin")).await.unwrap();
        assert_eq!(vfs.file_len("/tmp/out.bin"), Some(0));
        w.write_all(b"hello ").await.unwrap();
        assert_eq!(vfs.file_len("out.bin"), Some(6));
        w.write_all(b"world").await.unwrap();
        w.shutdown().await.unwrap();
        assert_eq!(vfs.read("/tmp/out.bin").unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn create_truncates() {
        let vfs = MemoryVfs::new();
        vfs.write("/f", b"previous");
        let _w = vfs.create(Path::new("/f")).await.unwrap();
        assert_eq!(vfs.read("/f").unwrap(), b"");
    }

    #[tokio::test]
    async fn create_without_parent_fails() {
        let vfs = MemoryVfs::new();
        assert!(vfs.create(Path::new("/no/such/dir/file")).await.is_err());
        assert!(!vfs.exists("/no/such/dir/file"));
    }

    #[tokio::test]
    async fn create_over_directory_fails() {
        let vfs = MemoryVfs::new();
        vfs.mkdir("/dir");
        let err = vfs.create(Path::new("/dir")).await.err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::IsADirectory);
    }

    #[test]
    fn current_dir_is_configured_cwd() {
        let vfs = MemoryVfs::new().with_cwd("/home/user");
        assert_eq!(vfs.current_dir().unwrap(), PathBuf::from("/home/user"));
        assert!(vfs.exists("/home/user"));
    }
}
