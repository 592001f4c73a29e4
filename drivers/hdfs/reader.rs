//! Streaming read session / 流式读取会话

use bytes::Bytes;
use futures::stream::BoxStream;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::StreamReader;

use crate::storage::InterruptSignal;

/// Read session positioned at an offset of one remote file
///
/// Every poll first checks the owning request's cancellation and deadline,
/// so an abandoned download stops pulling bytes from the datanode.
pub struct HdfsFileReader {
    path: String,
    offset: u64,
    inner: StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>,
    signal: InterruptSignal,
}

impl HdfsFileReader {
    pub fn new(
        path: impl Into<String>,
        offset: u64,
        stream: BoxStream<'static, io::Result<Bytes>>,
        signal: InterruptSignal,
    ) -> Self {
        Self {
            path: path.into(),
            offset,
            inner: StreamReader::new(stream),
            signal,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Position the session started at / 起始偏移
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl AsyncRead for HdfsFileReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Poll::Ready(reason) = this.signal.poll_interrupted(cx) {
            tracing::debug!("HDFS: read of {} interrupted: {}", this.path, reason);
            return Poll::Ready(Err(reason.into()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}
