//! Write session / 写入会话

use async_trait::async_trait;
use std::sync::Arc;

use super::client::{NameNodeClient, RemoteFileWriter};
use super::driver::map_remote;
use crate::storage::{FileWriter, RequestContext, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    Closed,
    Committed,
    Cancelled,
}

impl WriterState {
    fn label(self) -> &'static str {
        match self {
            WriterState::Open => "open",
            WriterState::Closed => "closed",
            WriterState::Committed => "committed",
            WriterState::Cancelled => "cancelled",
        }
    }
}

/// Unbuffered writer over one remote file handle / HDFS 文件写入器
///
/// Bytes reach the backend before `write` returns, so they are visible to
/// readers immediately. `size` starts at the length already present when
/// the session was opened for append. `cancel` deletes the remote file, so
/// an append session that is cancelled loses the earlier content as well.
pub struct HdfsFileWriter {
    handle: Option<Box<dyn RemoteFileWriter>>,
    client: Arc<dyn NameNodeClient>,
    driver: String,
    path: String,
    size: u64,
    state: WriterState,
    ctx: RequestContext,
}

impl HdfsFileWriter {
    pub(crate) fn new(
        handle: Box<dyn RemoteFileWriter>,
        client: Arc<dyn NameNodeClient>,
        driver: &str,
        path: String,
        size: u64,
        ctx: RequestContext,
    ) -> Self {
        Self {
            handle: Some(handle),
            client,
            driver: driver.to_string(),
            path,
            size,
            state: WriterState::Open,
            ctx,
        }
    }

    fn ensure_open(&self) -> StorageResult<()> {
        match self.state {
            WriterState::Open => Ok(()),
            state => Err(StorageError::WriterClosed { state: state.label() }),
        }
    }

    /// Close the remote handle if it is still held
    async fn close_handle(&mut self) -> StorageResult<()> {
        if let Some(mut handle) = self.handle.take() {
            let ctx = self.ctx.clone();
            ctx.run(handle.close())
                .await
                .map_err(|e| map_remote(&self.driver, &self.path, e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileWriter for HdfsFileWriter {
    async fn write(&mut self, buf: &[u8]) -> StorageResult<usize> {
        self.ensure_open()?;
        let handle = match self.handle.as_mut() {
            Some(handle) => handle,
            None => return Err(StorageError::WriterClosed { state: "closed" }),
        };
        self.ctx
            .run(handle.write(buf))
            .await
            .map_err(|e| map_remote(&self.driver, &self.path, e))?;
        self.size += buf.len() as u64;
        Ok(buf.len())
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn close(&mut self) -> StorageResult<()> {
        if self.state == WriterState::Open {
            self.state = WriterState::Closed;
        }
        self.close_handle().await
    }

    async fn cancel(&mut self) -> StorageResult<()> {
        match self.state {
            WriterState::Committed | WriterState::Cancelled => {
                return Err(StorageError::WriterClosed { state: self.state.label() })
            }
            WriterState::Open | WriterState::Closed => {}
        }
        self.state = WriterState::Cancelled;
        // Discarding must not be blocked by a failed close
        if let Err(e) = self.close_handle().await {
            tracing::warn!("HDFS: close before cancel of {} failed: {}", self.path, e);
        }

        // Removes the whole file, including content from earlier sessions
        tracing::debug!("HDFS: cancel write of {}, removing object", self.path);
        let client = self.client.clone();
        match self.ctx.run(client.remove(&self.path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(map_remote(&self.driver, &self.path, e)),
        }
    }

    async fn commit(&mut self) -> StorageResult<()> {
        self.ensure_open()?;
        self.close_handle().await?;
        self.state = WriterState::Committed;
        tracing::debug!("HDFS: committed {} ({} bytes)", self.path, self.size);
        Ok(())
    }
}

impl Drop for HdfsFileWriter {
    fn drop(&mut self) {
        if self.handle.is_some() && self.state == WriterState::Open {
            tracing::warn!("HDFS: writer for {} dropped without close", self.path);
        }
    }
}
