//! In-memory namenode / 内存名称节点
//!
//! Implements [`NameNodeClient`] over a process-local namespace with HDFS
//! semantics (create fails on existing files, append needs an existing file,
//! non-recursive remove refuses non-empty directories). Clones share the same
//! namespace, so a test can keep a handle while a driver owns another.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::client::{
    Connector, FileStatus, NameNodeClient, RemoteError, RemoteFileReader, RemoteFileWriter,
    RemoteResult,
};
use super::config::{HdfsParameters, DEFAULT_USER};
use crate::utils::{base_name, fix_and_clean_path, get_parent_path, has_path_prefix};

const STREAM_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, modified: DateTime<Utc> },
    Dir { mode: u32, modified: DateTime<Utc> },
}

impl Node {
    fn status(&self, path: &str) -> FileStatus {
        match self {
            Node::File { data, modified } => FileStatus {
                name: base_name(path).to_string(),
                length: data.len() as u64,
                modification_time: *modified,
                is_dir: false,
            },
            Node::Dir { modified, .. } => FileStatus {
                name: base_name(path).to_string(),
                length: 0,
                modification_time: *modified,
                is_dir: true,
            },
        }
    }
}

struct Inner {
    nodes: RwLock<BTreeMap<String, Node>>,
    /// One-shot injected failures, keyed by operation name
    faults: Mutex<HashSet<&'static str>>,
}

/// In-memory namenode client / 内存客户端
#[derive(Clone)]
pub struct MemoryNameNode {
    inner: Arc<Inner>,
    user: String,
}

impl Default for MemoryNameNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNameNode {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            Node::Dir {
                mode: 0o755,
                modified: Utc::now(),
            },
        );
        Self {
            inner: Arc::new(Inner {
                nodes: RwLock::new(nodes),
                faults: Mutex::new(HashSet::new()),
            }),
            user: DEFAULT_USER.to_string(),
        }
    }

    /// Handle on the same namespace presenting another identity
    pub fn with_user(&self, user: &str) -> Self {
        Self {
            inner: self.inner.clone(),
            user: user.to_string(),
        }
    }

    /// Make the next call of `op` fail / 注入一次性故障
    ///
    /// `op` is a client method name (`create`, `append`, `mkdir_all`, ...) or
    /// `write`/`close` for open write handles.
    pub fn fail_next(&self, op: &'static str) {
        self.inner.faults.lock().insert(op);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.nodes.read().contains_key(&fix_and_clean_path(path))
    }

    /// Permission bits of a directory
    pub fn dir_mode(&self, path: &str) -> Option<u32> {
        match self.inner.nodes.read().get(&fix_and_clean_path(path)) {
            Some(Node::Dir { mode, .. }) => Some(*mode),
            _ => None,
        }
    }

    fn check_fault(&self, op: &'static str) -> RemoteResult<()> {
        check_fault(&self.inner, op)
    }

    fn writer(&self, path: String) -> Box<dyn RemoteFileWriter> {
        Box::new(MemoryFileWriter {
            inner: self.inner.clone(),
            path,
            closed: false,
        })
    }
}

fn check_fault(inner: &Inner, op: &'static str) -> RemoteResult<()> {
    if inner.faults.lock().remove(op) {
        return Err(RemoteError::exception("InjectedFault", format!("{} failed", op)));
    }
    Ok(())
}

fn not_a_file(path: &str) -> RemoteError {
    RemoteError::exception("IOException", format!("Path is not a file: {}", path))
}

/// Keys of `path` and everything below it
fn subtree_keys(nodes: &BTreeMap<String, Node>, path: &str) -> Vec<String> {
    nodes
        .keys()
        .filter(|key| has_path_prefix(key, path))
        .cloned()
        .collect()
}

#[async_trait]
impl NameNodeClient for MemoryNameNode {
    fn user(&self) -> &str {
        &self.user
    }

    async fn read_file(&self, path: &str) -> RemoteResult<Bytes> {
        self.check_fault("read_file")?;
        match self.inner.nodes.read().get(path) {
            Some(Node::File { data, .. }) => Ok(Bytes::from(data.clone())),
            Some(Node::Dir { .. }) => Err(not_a_file(path)),
            None => Err(RemoteError::NotFound(path.to_string())),
        }
    }

    async fn open(&self, path: &str) -> RemoteResult<Box<dyn RemoteFileReader>> {
        self.check_fault("open")?;
        match self.inner.nodes.read().get(path) {
            Some(Node::File { data, .. }) => Ok(Box::new(MemoryFileReader {
                data: Bytes::from(data.clone()),
                pos: 0,
            })),
            Some(Node::Dir { .. }) => Err(not_a_file(path)),
            None => Err(RemoteError::NotFound(path.to_string())),
        }
    }

    async fn create(&self, path: &str) -> RemoteResult<Box<dyn RemoteFileWriter>> {
        self.check_fault("create")?;
        let mut nodes = self.inner.nodes.write();
        if nodes.contains_key(path) {
            return Err(RemoteError::AlreadyExists(path.to_string()));
        }
        let parent = get_parent_path(path);
        match nodes.get(&parent) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => {
                return Err(RemoteError::exception(
                    "ParentNotDirectoryException",
                    format!("Parent path is not a directory: {}", parent),
                ))
            }
            None => return Err(RemoteError::NotFound(parent)),
        }
        nodes.insert(
            path.to_string(),
            Node::File {
                data: Vec::new(),
                modified: Utc::now(),
            },
        );
        drop(nodes);
        Ok(self.writer(path.to_string()))
    }

    async fn append(&self, path: &str) -> RemoteResult<Box<dyn RemoteFileWriter>> {
        self.check_fault("append")?;
        match self.inner.nodes.read().get(path) {
            Some(Node::File { .. }) => {}
            Some(Node::Dir { .. }) => return Err(not_a_file(path)),
            None => return Err(RemoteError::NotFound(path.to_string())),
        }
        Ok(self.writer(path.to_string()))
    }

    async fn remove(&self, path: &str) -> RemoteResult<()> {
        self.check_fault("remove")?;
        let mut nodes = self.inner.nodes.write();
        if !nodes.contains_key(path) {
            return Err(RemoteError::NotFound(path.to_string()));
        }
        if path == "/" || subtree_keys(&nodes, path).len() > 1 {
            return Err(RemoteError::exception(
                "PathIsNotEmptyDirectoryException",
                format!("{} is non empty", path),
            ));
        }
        nodes.remove(path);
        Ok(())
    }

    async fn remove_all(&self, path: &str) -> RemoteResult<()> {
        self.check_fault("remove_all")?;
        let mut nodes = self.inner.nodes.write();
        if !nodes.contains_key(path) {
            return Err(RemoteError::NotFound(path.to_string()));
        }
        for key in subtree_keys(&nodes, path) {
            if key != "/" {
                nodes.remove(&key);
            }
        }
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> RemoteResult<()> {
        self.check_fault("rename")?;
        let mut nodes = self.inner.nodes.write();
        let source_is_dir = match nodes.get(from) {
            Some(node) => matches!(node, Node::Dir { .. }),
            None => return Err(RemoteError::NotFound(from.to_string())),
        };
        if from == to {
            return Ok(());
        }
        if has_path_prefix(to, from) {
            return Err(RemoteError::exception(
                "IOException",
                format!("Cannot move {} into its own subtree {}", from, to),
            ));
        }
        match nodes.get(&get_parent_path(to)) {
            Some(Node::Dir { .. }) => {}
            _ => return Err(RemoteError::NotFound(get_parent_path(to))),
        }
        match nodes.get(to) {
            Some(Node::Dir { .. }) => return Err(RemoteError::AlreadyExists(to.to_string())),
            Some(Node::File { .. }) if source_is_dir => {
                return Err(RemoteError::AlreadyExists(to.to_string()))
            }
            _ => {}
        }

        for key in subtree_keys(&nodes, from) {
            if let Some(node) = nodes.remove(&key) {
                let moved = format!("{}{}", to, &key[from.len()..]);
                nodes.insert(moved, node);
            }
        }
        Ok(())
    }

    async fn stat(&self, path: &str) -> RemoteResult<FileStatus> {
        self.check_fault("stat")?;
        self.inner
            .nodes
            .read()
            .get(path)
            .map(|node| node.status(path))
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn read_dir(&self, path: &str) -> RemoteResult<Vec<FileStatus>> {
        self.check_fault("read_dir")?;
        let nodes = self.inner.nodes.read();
        match nodes.get(path) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => {
                return Err(RemoteError::exception(
                    "IOException",
                    format!("Not a directory: {}", path),
                ))
            }
            None => return Err(RemoteError::NotFound(path.to_string())),
        }
        Ok(nodes
            .iter()
            .filter(|(key, _)| key.as_str() != path && get_parent_path(key) == path)
            .map(|(key, node)| node.status(key))
            .collect())
    }

    async fn mkdir_all(&self, path: &str, mode: u32) -> RemoteResult<()> {
        self.check_fault("mkdir_all")?;
        let path = fix_and_clean_path(path);
        let mut nodes = self.inner.nodes.write();
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            match nodes.get(&current) {
                Some(Node::Dir { .. }) => {}
                Some(Node::File { .. }) => {
                    return Err(RemoteError::exception(
                        "ParentNotDirectoryException",
                        format!("Path is not a directory: {}", current),
                    ))
                }
                None => {
                    nodes.insert(
                        current.clone(),
                        Node::Dir {
                            mode,
                            modified: Utc::now(),
                        },
                    );
                }
            }
        }
        Ok(())
    }
}

struct MemoryFileReader {
    data: Bytes,
    pos: u64,
}

#[async_trait]
impl RemoteFileReader for MemoryFileReader {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    async fn seek(&mut self, offset: u64) -> RemoteResult<u64> {
        self.pos = offset.min(self.len());
        Ok(self.pos)
    }

    fn into_stream(self: Box<Self>) -> BoxStream<'static, std::io::Result<Bytes>> {
        let rest = self.data.slice(self.pos as usize..);
        let chunks: Vec<std::io::Result<Bytes>> = (0..rest.len())
            .step_by(STREAM_CHUNK)
            .map(|start| Ok(rest.slice(start..(start + STREAM_CHUNK).min(rest.len()))))
            .collect();
        stream::iter(chunks).boxed()
    }
}

struct MemoryFileWriter {
    inner: Arc<Inner>,
    path: String,
    closed: bool,
}

#[async_trait]
impl RemoteFileWriter for MemoryFileWriter {
    async fn write(&mut self, data: &[u8]) -> RemoteResult<()> {
        check_fault(&self.inner, "write")?;
        if self.closed {
            return Err(RemoteError::exception("IOException", "Stream closed"));
        }
        match self.inner.nodes.write().get_mut(&self.path) {
            Some(Node::File { data: content, modified }) => {
                content.extend_from_slice(data);
                *modified = Utc::now();
                Ok(())
            }
            _ => Err(RemoteError::NotFound(self.path.clone())),
        }
    }

    async fn close(&mut self) -> RemoteResult<()> {
        check_fault(&self.inner, "close")?;
        self.closed = true;
        Ok(())
    }
}

/// Connector handing out handles on one in-memory namespace / 内存连接器
pub struct MemoryConnector {
    namenode: MemoryNameNode,
    reachable: bool,
}

impl MemoryConnector {
    pub fn new(namenode: MemoryNameNode) -> Self {
        Self {
            namenode,
            reachable: true,
        }
    }

    /// Connector whose every connection attempt fails
    pub fn unreachable() -> Self {
        Self {
            namenode: MemoryNameNode::new(),
            reachable: false,
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, params: &HdfsParameters) -> RemoteResult<Arc<dyn NameNodeClient>> {
        if !self.reachable {
            return Err(RemoteError::Connect(format!(
                "namenode {} is unreachable",
                params.namenode
            )));
        }
        Ok(Arc::new(self.namenode.with_user(&params.user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_create_write_read() {
        let nn = MemoryNameNode::new();
        nn.mkdir_all("/a/b", 0o700).await.unwrap();
        assert_eq!(nn.dir_mode("/a"), Some(0o700));

        let mut w = nn.create("/a/b/f").await.unwrap();
        w.write(b"hello ").await.unwrap();
        w.write(b"world").await.unwrap();
        w.close().await.unwrap();
        assert!(w.write(b"!").await.is_err());

        assert_eq!(nn.read_file("/a/b/f").await.unwrap(), Bytes::from_static(b"hello world"));
        assert!(matches!(nn.create("/a/b/f").await, Err(RemoteError::AlreadyExists(_))));
        assert!(matches!(nn.create("/missing/f").await, Err(RemoteError::NotFound(_))));

        let mut r = nn.open("/a/b/f").await.unwrap();
        assert_eq!(r.len(), 11);
        assert_eq!(r.seek(6).await.unwrap(), 6);
        let chunks: Vec<Bytes> = r.into_stream().try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"world".to_vec());
    }

    #[tokio::test]
    async fn test_seek_clamps_to_len() {
        let nn = MemoryNameNode::new();
        nn.create("/f").await.unwrap().write(b"abc").await.unwrap();
        let mut r = nn.open("/f").await.unwrap();
        assert_eq!(r.seek(10).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_remove_semantics() {
        let nn = MemoryNameNode::new();
        nn.mkdir_all("/d/e", 0o755).await.unwrap();
        nn.create("/d/e/f").await.unwrap();
        assert!(matches!(nn.remove("/d").await, Err(RemoteError::Exception { .. })));
        nn.remove_all("/d").await.unwrap();
        assert!(!nn.contains("/d/e/f"));
        assert!(!nn.contains("/d"));
        assert!(matches!(nn.remove_all("/d").await, Err(RemoteError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rename_subtree_and_overwrite() {
        let nn = MemoryNameNode::new();
        nn.mkdir_all("/src/x", 0o755).await.unwrap();
        nn.create("/src/x/f").await.unwrap();
        nn.mkdir_all("/dst", 0o755).await.unwrap();
        nn.rename("/src", "/dst/moved").await.unwrap();
        assert!(nn.contains("/dst/moved/x/f"));
        assert!(!nn.contains("/src"));

        nn.create("/a").await.unwrap().write(b"new").await.unwrap();
        nn.create("/b").await.unwrap().write(b"old").await.unwrap();
        nn.rename("/a", "/b").await.unwrap();
        assert_eq!(nn.read_file("/b").await.unwrap(), Bytes::from_static(b"new"));
        assert!(matches!(nn.rename("/a", "/c").await, Err(RemoteError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_read_dir_only_direct_children() {
        let nn = MemoryNameNode::new();
        nn.mkdir_all("/p/q/r", 0o755).await.unwrap();
        nn.create("/p/file").await.unwrap();
        let names: Vec<String> = nn.read_dir("/p").await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["file".to_string(), "q".to_string()]);
        assert!(matches!(nn.read_dir("/nope").await, Err(RemoteError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_injected_fault_is_one_shot() {
        let nn = MemoryNameNode::new();
        nn.fail_next("stat");
        assert!(nn.stat("/").await.is_err());
        assert!(nn.stat("/").await.unwrap().is_dir);
    }

    #[tokio::test]
    async fn test_connector() {
        let nn = MemoryNameNode::new();
        let params = HdfsParameters::new("nn:8020").unwrap();
        let client = MemoryConnector::new(nn.clone()).connect(&params).await.unwrap();
        assert_eq!(client.user(), "hdfs");
        client.mkdir_all("/shared", 0o755).await.unwrap();
        assert!(nn.contains("/shared"));

        assert!(matches!(
            MemoryConnector::unreachable().connect(&params).await,
            Err(RemoteError::Connect(_))
        ));
    }
}
