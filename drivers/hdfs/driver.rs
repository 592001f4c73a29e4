//! HDFS storage driver / HDFS 存储驱动
//!
//! Stores registry blobs below a configured root directory of an HDFS
//! namespace, reached through a shared [`NameNodeClient`].

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use super::client::{Connector, NameNodeClient, RemoteError};
use super::config::HdfsParameters;
use super::reader::HdfsFileReader;
use super::writer::HdfsFileWriter;
use crate::storage::{
    Capability, FileInfo, FileWriter, ReadStream, RequestContext, StorageDriver, StorageError,
    StorageResult,
};
use crate::utils::{fix_and_clean_path, get_parent_path, has_path_prefix, join_path};

pub const DRIVER_NAME: &str = "HDFS Storage Driver";
pub const DRIVER_VERSION: &str = "0.1";

/// Translate a client error for `path` into the storage taxonomy
pub(crate) fn map_remote(driver: &str, path: &str, err: RemoteError) -> StorageError {
    match err {
        RemoteError::NotFound(_) => StorageError::path_not_found(path),
        RemoteError::Interrupted(reason) => StorageError::Interrupted(reason),
        other => {
            tracing::warn!("HDFS: {} failed: {}", path, other);
            StorageError::backend(driver, other)
        }
    }
}

pub struct HdfsDriver {
    params: HdfsParameters,
    client: Arc<dyn NameNodeClient>,
}

impl HdfsDriver {
    /// Connect to the namenode as the configured user / 连接名称节点
    pub async fn connect(params: HdfsParameters, connector: &dyn Connector) -> StorageResult<Self> {
        tracing::info!(
            "HDFS: connecting to {} as {} (root {})",
            params.namenode,
            params.user,
            params.root_directory
        );
        let client = connector
            .connect(&params)
            .await
            .map_err(|e| StorageError::Connect {
                driver: DRIVER_NAME.to_string(),
                source: Box::new(e),
            })?;
        Ok(Self::with_client(params, client))
    }

    /// Bind an already connected client
    pub fn with_client(params: HdfsParameters, client: Arc<dyn NameNodeClient>) -> Self {
        Self { params, client }
    }

    pub fn params(&self) -> &HdfsParameters {
        &self.params
    }

    /// Resolve a logical path below the root / 解析为根目录下的完整路径
    ///
    /// A path already under the root is kept as is; anything else is joined
    /// onto the root. The result never leaves the root.
    pub fn full_path(&self, sub_path: &str) -> StorageResult<String> {
        let root = &self.params.root_directory;
        let joined = if has_path_prefix(sub_path, root) {
            sub_path.to_string()
        } else {
            format!("{}/{}", root, sub_path)
        };
        let full = fix_and_clean_path(&joined);
        if !has_path_prefix(&full, root) {
            tracing::warn!("HDFS: path {} escapes root {}", sub_path, root);
            return Err(StorageError::invalid_path(sub_path));
        }
        Ok(full)
    }

    /// Create the missing ancestors of `full_path` with the directory mask
    async fn make_parent_dir(&self, ctx: &RequestContext, full_path: &str) -> StorageResult<()> {
        let parent = get_parent_path(full_path);
        ctx.run(self.client.mkdir_all(&parent, self.params.directory_umask))
            .await
            .map_err(|e| self.remote_error(&parent, e))
    }

    fn remote_error(&self, path: &str, err: RemoteError) -> StorageError {
        if err.is_not_found() {
            tracing::debug!("HDFS: not found: {}", path);
        }
        map_remote(DRIVER_NAME, path, err)
    }

    /// Open a write session following the create / truncate / append rules
    async fn open_writer(
        &self,
        ctx: &RequestContext,
        path: &str,
        append: bool,
    ) -> StorageResult<HdfsFileWriter> {
        let full = self.full_path(path)?;
        self.make_parent_dir(ctx, &full).await?;

        let existing = match ctx.run(self.client.stat(&full)).await {
            Ok(status) => Some(status),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(self.remote_error(&full, e)),
        };

        let (handle, size) = match existing {
            Some(status) if append => {
                tracing::debug!("HDFS: append to {} at {}", full, status.length);
                let handle = ctx
                    .run(self.client.append(&full))
                    .await
                    .map_err(|e| self.remote_error(&full, e))?;
                (handle, status.length)
            }
            Some(_) => {
                tracing::debug!("HDFS: truncate {}", full);
                ctx.run(self.client.remove(&full))
                    .await
                    .map_err(|e| self.remote_error(&full, e))?;
                let handle = ctx
                    .run(self.client.create(&full))
                    .await
                    .map_err(|e| self.remote_error(&full, e))?;
                (handle, 0)
            }
            None => {
                tracing::debug!("HDFS: create {}", full);
                let handle = ctx
                    .run(self.client.create(&full))
                    .await
                    .map_err(|e| self.remote_error(&full, e))?;
                (handle, 0)
            }
        };

        Ok(HdfsFileWriter::new(
            handle,
            self.client.clone(),
            DRIVER_NAME,
            full,
            size,
            ctx.clone(),
        ))
    }
}

#[async_trait]
impl StorageDriver for HdfsDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn version(&self) -> &str {
        DRIVER_VERSION
    }

    fn capabilities(&self) -> Capability {
        Capability {
            can_range_read: true,
            can_append: true,
            can_direct_link: false,
            transactional_writes: false,
        }
    }

    async fn get_content(&self, ctx: &RequestContext, path: &str) -> StorageResult<Bytes> {
        let full = self.full_path(path)?;
        ctx.run(self.client.read_file(&full))
            .await
            .map_err(|e| self.remote_error(&full, e))
    }

    async fn put_content(&self, ctx: &RequestContext, path: &str, content: &[u8]) -> StorageResult<()> {
        let mut writer = self.open_writer(ctx, path, false).await?;
        if let Err(e) = writer.write(content).await {
            if let Err(close_err) = writer.close().await {
                tracing::warn!("HDFS: close after failed write of {} failed: {}", path, close_err);
            }
            return Err(e);
        }
        writer.commit().await?;
        writer.close().await
    }

    async fn reader(&self, ctx: &RequestContext, path: &str, offset: u64) -> StorageResult<ReadStream> {
        let full = self.full_path(path)?;
        let mut handle = ctx
            .run(self.client.open(&full))
            .await
            .map_err(|e| self.remote_error(&full, e))?;

        if offset > handle.len() {
            return Err(StorageError::InvalidOffset { path: full, offset });
        }
        let reached = ctx
            .run(handle.seek(offset))
            .await
            .map_err(|e| self.remote_error(&full, e))?;
        if reached < offset {
            return Err(StorageError::InvalidOffset { path: full, offset });
        }

        Ok(Box::new(HdfsFileReader::new(
            full,
            offset,
            handle.into_stream(),
            ctx.signal(),
        )))
    }

    async fn writer(
        &self,
        ctx: &RequestContext,
        path: &str,
        append: bool,
    ) -> StorageResult<Box<dyn FileWriter>> {
        Ok(Box::new(self.open_writer(ctx, path, append).await?))
    }

    async fn stat(&self, ctx: &RequestContext, path: &str) -> StorageResult<FileInfo> {
        let full = self.full_path(path)?;
        let status = ctx
            .run(self.client.stat(&full))
            .await
            .map_err(|e| self.remote_error(&full, e))?;
        Ok(FileInfo {
            path: full,
            size: status.length,
            mod_time: status.modification_time,
            is_dir: status.is_dir,
        })
    }

    async fn list(&self, ctx: &RequestContext, path: &str) -> StorageResult<Vec<String>> {
        let full = self.full_path(path)?;
        match ctx.run(self.client.read_dir(&full)).await {
            Ok(entries) => {
                let mut children: Vec<String> =
                    entries.iter().map(|entry| join_path(&full, &entry.name)).collect();
                children.sort();
                Ok(children)
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("HDFS: list of missing {} is empty", full);
                Ok(Vec::new())
            }
            Err(e) => Err(self.remote_error(&full, e)),
        }
    }

    async fn move_item(&self, ctx: &RequestContext, source: &str, dest: &str) -> StorageResult<()> {
        let from = self.full_path(source)?;
        let to = self.full_path(dest)?;
        self.make_parent_dir(ctx, &to).await?;
        tracing::debug!("HDFS: move {} -> {}", from, to);
        ctx.run(self.client.rename(&from, &to))
            .await
            .map_err(|e| self.remote_error(&from, e))
    }

    async fn delete(&self, ctx: &RequestContext, path: &str) -> StorageResult<()> {
        let full = self.full_path(path)?;
        tracing::debug!("HDFS: delete {}", full);
        ctx.run(self.client.remove_all(&full))
            .await
            .map_err(|e| self.remote_error(&full, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::hdfs::memory::{MemoryConnector, MemoryNameNode};
    use crate::storage::Interrupted;
    use serde_json::json;
    use tokio::io::AsyncReadExt;

    const ROOT: &str = "/tmp/hdfs-registry";

    fn setup() -> (MemoryNameNode, HdfsDriver) {
        let nn = MemoryNameNode::new();
        let params = HdfsParameters::new("memory:8020").unwrap();
        let driver = HdfsDriver::with_client(params, Arc::new(nn.clone()));
        (nn, driver)
    }

    async fn read_all(driver: &HdfsDriver, path: &str, offset: u64) -> StorageResult<Vec<u8>> {
        let ctx = RequestContext::background();
        let mut reader = driver.reader(&ctx, path, offset).await?;
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        Ok(out)
    }

    #[test]
    fn test_full_path() {
        let (_, driver) = setup();
        assert_eq!(driver.full_path("/a/b").unwrap(), "/tmp/hdfs-registry/a/b");
        assert_eq!(driver.full_path("a/b").unwrap(), "/tmp/hdfs-registry/a/b");
        assert_eq!(driver.full_path("/").unwrap(), ROOT);
        assert_eq!(driver.full_path(ROOT).unwrap(), ROOT);
        assert_eq!(
            driver.full_path("/tmp/hdfs-registry/a/b").unwrap(),
            "/tmp/hdfs-registry/a/b"
        );
        // A sibling sharing the root as a string prefix is not under it
        assert_eq!(
            driver.full_path("/tmp/hdfs-registryX/a").unwrap(),
            "/tmp/hdfs-registry/tmp/hdfs-registryX/a"
        );
    }

    #[test]
    fn test_full_path_rejects_escape() {
        let (_, driver) = setup();
        assert!(matches!(
            driver.full_path("/../../etc/passwd"),
            Err(StorageError::InvalidPath { .. })
        ));
        assert!(matches!(
            driver.full_path("/tmp/hdfs-registry/../secret"),
            Err(StorageError::InvalidPath { .. })
        ));
        assert_eq!(driver.full_path("/a/../b").unwrap(), "/tmp/hdfs-registry/b");
    }

    #[tokio::test]
    async fn test_put_get_content() {
        let (nn, driver) = setup();
        let ctx = RequestContext::background();
        let big: Vec<u8> = (0..200 * 1024).map(|i| (i % 251) as u8).collect();

        for (path, content) in [("/empty", Vec::new()), ("/one", vec![7u8]), ("/multi/block", big)] {
            driver.put_content(&ctx, path, &content).await.unwrap();
            let got = driver.get_content(&ctx, path).await.unwrap();
            assert_eq!(got.as_ref(), content.as_slice(), "content of {}", path);
            assert_eq!(read_all(&driver, path, 0).await.unwrap(), content);
        }
        assert!(nn.contains("/tmp/hdfs-registry/multi/block"));

        driver.put_content(&ctx, "/one", b"replaced").await.unwrap();
        assert_eq!(driver.get_content(&ctx, "/one").await.unwrap().as_ref(), b"replaced");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        match driver.get_content(&ctx, "/nope").await {
            Err(StorageError::PathNotFound { path }) => assert_eq!(path, "/tmp/hdfs-registry/nope"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(driver.stat(&ctx, "/nope").await.unwrap_err().is_not_found());
        assert!(matches!(
            driver.reader(&ctx, "/nope", 0).await,
            Err(StorageError::PathNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_append_accounting() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();

        let mut writer = driver.writer(&ctx, "/uploads/data", false).await.unwrap();
        assert_eq!(writer.size(), 0);
        assert_eq!(writer.write(b"hello").await.unwrap(), 5);
        assert_eq!(writer.size(), 5);
        writer.close().await.unwrap();

        let mut writer = driver.writer(&ctx, "/uploads/data", true).await.unwrap();
        assert_eq!(writer.size(), 5);
        writer.write(b" world").await.unwrap();
        assert_eq!(writer.size(), 11);
        writer.commit().await.unwrap();
        writer.close().await.unwrap();

        assert_eq!(driver.get_content(&ctx, "/uploads/data").await.unwrap().as_ref(), b"hello world");
        assert_eq!(driver.stat(&ctx, "/uploads/data").await.unwrap().size, 11);
    }

    #[tokio::test]
    async fn test_writer_truncates_and_append_on_missing_creates() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        driver.put_content(&ctx, "/f", b"old content").await.unwrap();

        let mut writer = driver.writer(&ctx, "/f", false).await.unwrap();
        assert_eq!(writer.size(), 0);
        writer.write(b"new").await.unwrap();
        writer.commit().await.unwrap();
        assert_eq!(driver.get_content(&ctx, "/f").await.unwrap().as_ref(), b"new");

        let mut writer = driver.writer(&ctx, "/fresh", true).await.unwrap();
        assert_eq!(writer.size(), 0);
        writer.write(b"x").await.unwrap();
        writer.commit().await.unwrap();
        assert_eq!(driver.stat(&ctx, "/fresh").await.unwrap().size, 1);
    }

    #[tokio::test]
    async fn test_writes_visible_before_commit() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        let mut writer = driver.writer(&ctx, "/partial", false).await.unwrap();
        writer.write(b"abc").await.unwrap();
        assert_eq!(driver.get_content(&ctx, "/partial").await.unwrap().as_ref(), b"abc");
        writer.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_reader_offsets() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        let content = b"0123456789";
        driver.put_content(&ctx, "/r", content).await.unwrap();

        for k in 0..=content.len() {
            let got = read_all(&driver, "/r", k as u64).await.unwrap();
            assert_eq!(got, &content[k..], "suffix from {}", k);
        }
        match driver.reader(&ctx, "/r", 11).await {
            Err(StorageError::InvalidOffset { path, offset }) => {
                assert_eq!(path, "/tmp/hdfs-registry/r");
                assert_eq!(offset, 11);
            }
            Err(e) => panic!("unexpected {:?}", e),
            Ok(_) => panic!("offset past the end accepted"),
        }
    }

    #[tokio::test]
    async fn test_stat() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        driver.put_content(&ctx, "/dir/file", b"abcd").await.unwrap();

        let info = driver.stat(&ctx, "/dir/file").await.unwrap();
        assert_eq!(info.path, "/tmp/hdfs-registry/dir/file");
        assert_eq!(info.size, 4);
        assert!(!info.is_dir);

        let info = driver.stat(&ctx, "/dir").await.unwrap();
        assert!(info.is_dir);
    }

    #[tokio::test]
    async fn test_list() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        assert!(driver.list(&ctx, "/missing").await.unwrap().is_empty());
        assert!(driver.list(&ctx, "/").await.unwrap().is_empty());

        driver.put_content(&ctx, "/l/b", b"1").await.unwrap();
        driver.put_content(&ctx, "/l/a", b"2").await.unwrap();
        driver.put_content(&ctx, "/l/sub/deep", b"3").await.unwrap();

        assert_eq!(
            driver.list(&ctx, "/l").await.unwrap(),
            vec![
                "/tmp/hdfs-registry/l/a".to_string(),
                "/tmp/hdfs-registry/l/b".to_string(),
                "/tmp/hdfs-registry/l/sub".to_string(),
            ]
        );
        assert_eq!(driver.list(&ctx, "/").await.unwrap(), vec!["/tmp/hdfs-registry/l".to_string()]);
    }

    #[tokio::test]
    async fn test_list_propagates_backend_errors() {
        let (nn, driver) = setup();
        let ctx = RequestContext::background();
        driver.put_content(&ctx, "/l/a", b"1").await.unwrap();
        nn.fail_next("read_dir");
        assert!(matches!(
            driver.list(&ctx, "/l").await,
            Err(StorageError::Backend { .. })
        ));
    }

    #[tokio::test]
    async fn test_move() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        driver.put_content(&ctx, "/a", b"payload").await.unwrap();

        driver.move_item(&ctx, "/a", "/nested/b").await.unwrap();
        assert!(driver.stat(&ctx, "/a").await.unwrap_err().is_not_found());
        assert_eq!(driver.stat(&ctx, "/nested/b").await.unwrap().size, 7);
        assert_eq!(driver.get_content(&ctx, "/nested/b").await.unwrap().as_ref(), b"payload");

        driver.put_content(&ctx, "/c", b"newer").await.unwrap();
        driver.move_item(&ctx, "/c", "/nested/b").await.unwrap();
        assert_eq!(driver.get_content(&ctx, "/nested/b").await.unwrap().as_ref(), b"newer");

        assert!(driver.move_item(&ctx, "/gone", "/x").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_recursive() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        driver.put_content(&ctx, "/d/x/1", b"1").await.unwrap();
        driver.put_content(&ctx, "/d/y", b"2").await.unwrap();

        driver.delete(&ctx, "/d").await.unwrap();
        assert!(driver.stat(&ctx, "/d/x/1").await.unwrap_err().is_not_found());
        assert!(driver.list(&ctx, "/d/x").await.unwrap().is_empty());
        assert!(driver.delete(&ctx, "/d").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_url_for_unsupported() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        driver.put_content(&ctx, "/f", b"1").await.unwrap();
        for path in ["/f", "/missing"] {
            let options = json!({ "method": "GET" });
            let options = options.as_object().unwrap();
            match driver.url_for(&ctx, path, options).await {
                Err(StorageError::UnsupportedMethod { driver: name }) => assert_eq!(name, DRIVER_NAME),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_directory_mask() {
        let nn = MemoryNameNode::new();
        let params = HdfsParameters::from_value(&json!({
            "hdfsnamenode": "memory:8020",
            "directoryumask": "700",
        }))
        .unwrap();
        let driver = HdfsDriver::with_client(params, Arc::new(nn.clone()));
        let ctx = RequestContext::background();
        driver.put_content(&ctx, "/blobs/sha256/ab/data", b"x").await.unwrap();
        assert_eq!(nn.dir_mode("/tmp/hdfs-registry/blobs/sha256/ab"), Some(0o700));
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let (nn, driver) = setup();
        let ctx = RequestContext::background();
        nn.fail_next("write");
        assert!(matches!(
            driver.put_content(&ctx, "/w", b"data").await,
            Err(StorageError::Backend { .. })
        ));

        nn.fail_next("close");
        assert!(driver.put_content(&ctx, "/w", b"data").await.is_err());

        nn.fail_next("create");
        assert!(driver.put_content(&ctx, "/w2", b"data").await.is_err());
    }

    #[tokio::test]
    async fn test_provisioning_failure_surfaces() {
        let (nn, driver) = setup();
        let ctx = RequestContext::background();

        nn.fail_next("mkdir_all");
        assert!(matches!(
            driver.writer(&ctx, "/p/f", false).await,
            Err(StorageError::Backend { .. })
        ));

        driver.put_content(&ctx, "/src", b"1").await.unwrap();
        nn.fail_next("mkdir_all");
        assert!(matches!(
            driver.move_item(&ctx, "/src", "/dst/f").await,
            Err(StorageError::Backend { .. })
        ));
        assert!(driver.stat(&ctx, "/src").await.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        ctx.cancel();
        assert!(matches!(
            driver.put_content(&ctx, "/c", b"1").await,
            Err(StorageError::Interrupted(Interrupted::Cancelled))
        ));
        assert!(matches!(
            driver.list(&ctx, "/").await,
            Err(StorageError::Interrupted(Interrupted::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_reader_observes_cancellation() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        driver.put_content(&ctx, "/big", &vec![1u8; 300 * 1024]).await.unwrap();

        let read_ctx = RequestContext::background();
        let mut reader = driver.reader(&read_ctx, "/big", 0).await.unwrap();
        let mut buf = [0u8; 1024];
        assert!(reader.read(&mut buf).await.unwrap() > 0);
        read_ctx.cancel();
        let err = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Interrupted);
    }

    #[tokio::test]
    async fn test_cancel_removes_object() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        let mut writer = driver.writer(&ctx, "/upload", false).await.unwrap();
        writer.write(b"discard me").await.unwrap();
        writer.cancel().await.unwrap();
        assert!(driver.stat(&ctx, "/upload").await.unwrap_err().is_not_found());
        assert!(matches!(
            writer.write(b"more").await,
            Err(StorageError::WriterClosed { state: "cancelled" })
        ));
        writer.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_append_removes_earlier_content() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        driver.put_content(&ctx, "/layer", b"first session").await.unwrap();

        let mut writer = driver.writer(&ctx, "/layer", true).await.unwrap();
        assert_eq!(writer.size(), 13);
        writer.write(b" second").await.unwrap();
        writer.cancel().await.unwrap();

        assert!(driver.stat(&ctx, "/layer").await.unwrap_err().is_not_found());
        assert!(driver.get_content(&ctx, "/layer").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_session_sealed_after_commit() {
        let (_, driver) = setup();
        let ctx = RequestContext::background();
        let mut writer = driver.writer(&ctx, "/sealed", false).await.unwrap();
        writer.write(b"abc").await.unwrap();
        writer.commit().await.unwrap();

        assert!(matches!(
            writer.write(b"d").await,
            Err(StorageError::WriterClosed { state: "committed" })
        ));
        assert!(matches!(writer.commit().await, Err(StorageError::WriterClosed { .. })));
        assert!(matches!(writer.cancel().await, Err(StorageError::WriterClosed { .. })));
        writer.close().await.unwrap();
        writer.close().await.unwrap();
        assert_eq!(driver.get_content(&ctx, "/sealed").await.unwrap().as_ref(), b"abc");
    }

    #[tokio::test]
    async fn test_connect() {
        let nn = MemoryNameNode::new();
        let params = HdfsParameters::new("memory:8020").unwrap();
        let driver = HdfsDriver::connect(params.clone(), &MemoryConnector::new(nn)).await.unwrap();
        assert_eq!(driver.params(), &params);
        assert_eq!(driver.name(), DRIVER_NAME);
        assert!(driver.capabilities().can_append);

        match HdfsDriver::connect(params, &MemoryConnector::unreachable()).await {
            Err(StorageError::Connect { driver, .. }) => assert_eq!(driver, DRIVER_NAME),
            Err(e) => panic!("unexpected {:?}", e),
            Ok(_) => panic!("connected to an unreachable namenode"),
        }
    }
}
