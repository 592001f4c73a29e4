//! Base driver wrapper / 基础驱动包装
//!
//! Wraps a concrete driver, rejects malformed logical paths before they
//! reach it and traces every contract call.

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;
use std::time::Instant;
use tracing::Instrument;

use super::{
    Capability, FileInfo, FileWriter, ReadStream, RequestContext, StorageDriver, StorageError,
    StorageResult,
};

/// Logical path grammar: one or more `/component` groups
static PATH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/[A-Za-z0-9._-]+)+$").expect("valid path regex"));

/// Check a logical path against the path grammar / 校验逻辑路径
pub fn validate_path(path: &str) -> StorageResult<()> {
    if PATH_REGEX.is_match(path) {
        Ok(())
    } else {
        Err(StorageError::invalid_path(path))
    }
}

/// Same as [`validate_path`] but also accepts the root `/` (listing only)
fn validate_list_path(path: &str) -> StorageResult<()> {
    if path == "/" {
        Ok(())
    } else {
        validate_path(path)
    }
}

/// Path-validating, tracing wrapper around a driver / 路径校验与追踪包装
pub struct Base<D> {
    driver: D,
}

impl<D: StorageDriver> Base<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    async fn traced<T, F>(&self, ctx: &RequestContext, op: &'static str, path: &str, fut: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        let span = tracing::debug_span!(
            "storage",
            driver = self.driver.name(),
            op,
            path,
            request_id = ctx.request_id().unwrap_or("-"),
        );
        async move {
            let started = Instant::now();
            let res = fut.await;
            match &res {
                Ok(_) => tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "ok"),
                Err(e) if e.is_not_found() => tracing::debug!("{}", e),
                Err(e) => tracing::warn!(elapsed_ms = started.elapsed().as_millis() as u64, "{}", e),
            }
            res
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<D: StorageDriver> StorageDriver for Base<D> {
    fn name(&self) -> &str {
        self.driver.name()
    }

    fn version(&self) -> &str {
        self.driver.version()
    }

    fn capabilities(&self) -> Capability {
        self.driver.capabilities()
    }

    async fn get_content(&self, ctx: &RequestContext, path: &str) -> StorageResult<Bytes> {
        validate_path(path)?;
        self.traced(ctx, "get_content", path, self.driver.get_content(ctx, path)).await
    }

    async fn put_content(&self, ctx: &RequestContext, path: &str, content: &[u8]) -> StorageResult<()> {
        validate_path(path)?;
        self.traced(ctx, "put_content", path, self.driver.put_content(ctx, path, content)).await
    }

    async fn reader(&self, ctx: &RequestContext, path: &str, offset: u64) -> StorageResult<ReadStream> {
        validate_path(path)?;
        self.traced(ctx, "reader", path, self.driver.reader(ctx, path, offset)).await
    }

    async fn writer(
        &self,
        ctx: &RequestContext,
        path: &str,
        append: bool,
    ) -> StorageResult<Box<dyn FileWriter>> {
        validate_path(path)?;
        self.traced(ctx, "writer", path, self.driver.writer(ctx, path, append)).await
    }

    async fn stat(&self, ctx: &RequestContext, path: &str) -> StorageResult<FileInfo> {
        validate_path(path)?;
        self.traced(ctx, "stat", path, self.driver.stat(ctx, path)).await
    }

    async fn list(&self, ctx: &RequestContext, path: &str) -> StorageResult<Vec<String>> {
        validate_list_path(path)?;
        self.traced(ctx, "list", path, self.driver.list(ctx, path)).await
    }

    async fn move_item(&self, ctx: &RequestContext, source: &str, dest: &str) -> StorageResult<()> {
        validate_path(source)?;
        validate_path(dest)?;
        self.traced(ctx, "move", source, self.driver.move_item(ctx, source, dest)).await
    }

    async fn delete(&self, ctx: &RequestContext, path: &str) -> StorageResult<()> {
        validate_path(path)?;
        self.traced(ctx, "delete", path, self.driver.delete(ctx, path)).await
    }

    async fn url_for(
        &self,
        ctx: &RequestContext,
        path: &str,
        options: &serde_json::Map<String, serde_json::Value>,
    ) -> StorageResult<String> {
        validate_path(path)?;
        self.traced(ctx, "url_for", path, self.driver.url_for(ctx, path, options)).await
    }
}
