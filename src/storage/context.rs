//! Request context / 请求上下文
//!
//! Carries the caller's cancellation signal and deadline into every remote
//! call, so a cancelled upstream request stops its in-flight backend I/O.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::{Instant, Sleep};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Why a request stopped before its backend call completed / 中断原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl From<Interrupted> for std::io::Error {
    fn from(value: Interrupted) -> Self {
        let kind = match value {
            Interrupted::Cancelled => std::io::ErrorKind::Interrupted,
            Interrupted::DeadlineExceeded => std::io::ErrorKind::TimedOut,
        };
        std::io::Error::new(kind, value)
    }
}

/// Per-request context passed to every driver operation / 每个请求的上下文
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    request_id: Option<String>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

impl RequestContext {
    /// Context that is never cancelled and has no deadline / 永不取消的上下文
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            request_id: None,
        }
    }

    /// Context bound to an upstream cancellation token
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
            request_id: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Cancel this request and every clone of it / 取消请求
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the interruption that already happened, if any
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Run a backend call, abandoning it when the context is cancelled or
    /// its deadline passes / 执行后端调用，支持取消与超时
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<Interrupted>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Interrupted::Cancelled.into()),
            _ = deadline => Err(Interrupted::DeadlineExceeded.into()),
            res = fut => res,
        }
    }

    /// Pollable signal for sessions that outlive a single call (streaming
    /// readers) / 供流式读取使用的中断信号
    pub fn signal(&self) -> InterruptSignal {
        InterruptSignal {
            cancelled: Box::pin(self.token.clone().cancelled_owned()),
            deadline: self.deadline.map(|d| Box::pin(tokio::time::sleep_until(d))),
        }
    }
}

/// Pollable form of a [`RequestContext`] / 可轮询的中断信号
pub struct InterruptSignal {
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl InterruptSignal {
    /// Ready once the request is cancelled or past its deadline.
    pub fn poll_interrupted(&mut self, cx: &mut Context<'_>) -> Poll<Interrupted> {
        if self.cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Interrupted::Cancelled);
        }
        if let Some(deadline) = self.deadline.as_mut() {
            if deadline.as_mut().poll(cx).is_ready() {
                return Poll::Ready(Interrupted::DeadlineExceeded);
            }
        }
        Poll::Pending
    }
}
