//! WebHDFS client / WebHDFS 客户端
//!
//! Implements [`NameNodeClient`] over the WebHDFS REST API with reqwest.
//! Data operations are redirected by the namenode to a datanode; reqwest
//! follows those redirects with the original method and body.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::client::{
    Connector, FileStatus, NameNodeClient, RemoteError, RemoteFileReader, RemoteFileWriter,
    RemoteResult,
};
use super::config::HdfsParameters;
use crate::utils::base_name;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RemoteExceptionEnvelope {
    #[serde(rename = "RemoteException")]
    remote_exception: RemoteExceptionBody,
}

#[derive(Debug, Deserialize)]
struct RemoteExceptionBody {
    exception: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFileStatus {
    #[serde(default)]
    path_suffix: String,
    #[serde(default)]
    length: u64,
    #[serde(default)]
    modification_time: i64,
    #[serde(rename = "type")]
    kind: String,
}

impl WireFileStatus {
    fn into_status(self, fallback_name: &str) -> FileStatus {
        let name = if self.path_suffix.is_empty() {
            fallback_name.to_string()
        } else {
            self.path_suffix
        };
        FileStatus {
            name,
            length: self.length,
            modification_time: millis_to_time(self.modification_time),
            is_dir: self.kind == "DIRECTORY",
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileStatusEnvelope {
    #[serde(rename = "FileStatus")]
    file_status: WireFileStatus,
}

#[derive(Debug, Deserialize)]
struct FileStatusesEnvelope {
    #[serde(rename = "FileStatuses")]
    file_statuses: FileStatusList,
}

#[derive(Debug, Deserialize)]
struct FileStatusList {
    #[serde(rename = "FileStatus", default)]
    file_status: Vec<WireFileStatus>,
}

#[derive(Debug, Deserialize)]
struct BooleanEnvelope {
    boolean: bool,
}

fn millis_to_time(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
}

fn io_error<E>(e: E) -> std::io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    std::io::Error::new(std::io::ErrorKind::Other, e)
}

/// Namenode address as a base URL; `host:port` gets the http scheme
fn base_url(namenode: &str) -> RemoteResult<Url> {
    let address = if namenode.contains("://") {
        namenode.to_string()
    } else {
        format!("http://{}", namenode)
    };
    let url = Url::parse(&address)
        .map_err(|e| RemoteError::Connect(format!("invalid namenode address {}: {}", namenode, e)))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(RemoteError::Connect(format!(
            "namenode address must be an http(s) URL: {}",
            namenode
        )));
    }
    Ok(url)
}

/// Map a failed WebHDFS response onto a [`RemoteError`] / 解析远程异常
fn remote_exception(status: StatusCode, body: &str, path: &str) -> RemoteError {
    match serde_json::from_str::<RemoteExceptionEnvelope>(body) {
        Ok(envelope) => {
            let RemoteExceptionBody { exception, message } = envelope.remote_exception;
            match exception.as_str() {
                "FileNotFoundException" => RemoteError::NotFound(path.to_string()),
                "FileAlreadyExistsException" => RemoteError::AlreadyExists(path.to_string()),
                "AccessControlException" | "SecurityException" => RemoteError::PermissionDenied(message),
                _ => RemoteError::Exception { exception, message },
            }
        }
        Err(_) => match status {
            StatusCode::NOT_FOUND => RemoteError::NotFound(path.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                RemoteError::PermissionDenied(format!("{}: {}", path, status))
            }
            _ => RemoteError::Exception {
                exception: format!("HTTP {}", status.as_u16()),
                message: if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or_default().to_string()
                } else {
                    body.trim().to_string()
                },
            },
        },
    }
}

async fn check(resp: Response, path: &str) -> RemoteResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(remote_exception(status, &body, path))
}

/// WebHDFS namenode client / WebHDFS 客户端
///
/// Cheap to clone; `reqwest::Client` is safe for concurrent use.
#[derive(Clone)]
pub struct WebHdfsClient {
    base: Url,
    user: String,
    /// Metadata and write requests, bounded by the request timeout
    http: Client,
    /// Streaming reads, bounded only by the connect timeout
    stream_http: Client,
}

impl WebHdfsClient {
    pub fn new(params: &HdfsParameters) -> RemoteResult<Self> {
        let base = base_url(&params.namenode)?;

        let http = Client::builder()
            .timeout(params.request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(8)
            .build()?;

        let stream_http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            base,
            user: params.user.clone(),
            http,
            stream_http,
        })
    }

    /// `{base}/webhdfs/v1{path}?op=..&user.name=..` with encoded segments;
    /// the root keeps its trailing slash (`/webhdfs/v1/`)
    fn url(&self, path: &str, op: &str, extra: &[(&str, String)]) -> Url {
        let mut url = self.base.clone();
        let mut parts = path.split('/').filter(|s| !s.is_empty()).peekable();
        let is_root = parts.peek().is_none();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["webhdfs", "v1"]).extend(parts);
            if is_root {
                segments.push("");
            }
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("op", op).append_pair("user.name", &self.user);
            for (key, value) in extra {
                query.append_pair(key, value);
            }
        }
        url
    }

    async fn send(&self, req: RequestBuilder, path: &str) -> RemoteResult<Response> {
        let resp = req.send().await?;
        check(resp, path).await
    }

    async fn boolean(&self, req: RequestBuilder, path: &str) -> RemoteResult<bool> {
        let resp = self.send(req, path).await?;
        Ok(resp.json::<BooleanEnvelope>().await?.boolean)
    }

    async fn delete(&self, path: &str, recursive: bool) -> RemoteResult<()> {
        tracing::debug!("WebHDFS DELETE: {} recursive={}", path, recursive);
        let url = self.url(path, "DELETE", &[("recursive", recursive.to_string())]);
        if self.boolean(self.http.delete(url), path).await? {
            Ok(())
        } else {
            Err(RemoteError::NotFound(path.to_string()))
        }
    }

    async fn try_rename(&self, from: &str, to: &str) -> RemoteResult<bool> {
        let url = self.url(from, "RENAME", &[("destination", to.to_string())]);
        self.boolean(self.http.put(url), from).await
    }
}

#[async_trait]
impl NameNodeClient for WebHdfsClient {
    fn user(&self) -> &str {
        &self.user
    }

    async fn read_file(&self, path: &str) -> RemoteResult<Bytes> {
        tracing::debug!("WebHDFS OPEN (whole file): {}", path);
        let url = self.url(path, "OPEN", &[]);
        let resp = self.send(self.stream_http.get(url), path).await?;
        Ok(resp.bytes().await?)
    }

    async fn open(&self, path: &str) -> RemoteResult<Box<dyn RemoteFileReader>> {
        let status = self.stat(path).await?;
        if status.is_dir {
            return Err(RemoteError::exception("IOException", format!("Path is not a file: {}", path)));
        }
        Ok(Box::new(WebHdfsFileReader {
            client: self.clone(),
            path: path.to_string(),
            length: status.length,
            pos: 0,
        }))
    }

    async fn create(&self, path: &str) -> RemoteResult<Box<dyn RemoteFileWriter>> {
        tracing::debug!("WebHDFS CREATE: {}", path);
        let url = self.url(path, "CREATE", &[("overwrite", "false".to_string())]);
        let req = self
            .http
            .put(url)
            .header("Content-Type", "application/octet-stream")
            .body(Bytes::new());
        self.send(req, path).await?;
        Ok(Box::new(WebHdfsFileWriter::new(self.clone(), path)))
    }

    async fn append(&self, path: &str) -> RemoteResult<Box<dyn RemoteFileWriter>> {
        // APPEND carries data, so opening only checks the target is a file
        let status = self.stat(path).await?;
        if status.is_dir {
            return Err(RemoteError::exception("IOException", format!("Path is not a file: {}", path)));
        }
        Ok(Box::new(WebHdfsFileWriter::new(self.clone(), path)))
    }

    async fn remove(&self, path: &str) -> RemoteResult<()> {
        self.delete(path, false).await
    }

    async fn remove_all(&self, path: &str) -> RemoteResult<()> {
        self.delete(path, true).await
    }

    async fn rename(&self, from: &str, to: &str) -> RemoteResult<()> {
        tracing::debug!("WebHDFS RENAME: {} -> {}", from, to);
        if self.try_rename(from, to).await? {
            return Ok(());
        }

        // RENAME answers false instead of raising; find out why
        let source = self.stat(from).await?;
        match self.stat(to).await {
            Ok(dest) if !dest.is_dir && !source.is_dir => {
                self.remove(to).await?;
                if self.try_rename(from, to).await? {
                    return Ok(());
                }
            }
            Ok(_) => return Err(RemoteError::AlreadyExists(to.to_string())),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        Err(RemoteError::exception(
            "IOException",
            format!("rename {} -> {} failed", from, to),
        ))
    }

    async fn stat(&self, path: &str) -> RemoteResult<FileStatus> {
        tracing::debug!("WebHDFS GETFILESTATUS: {}", path);
        let url = self.url(path, "GETFILESTATUS", &[]);
        let resp = self.send(self.http.get(url), path).await?;
        let envelope: FileStatusEnvelope = resp.json().await?;
        Ok(envelope.file_status.into_status(base_name(path)))
    }

    async fn read_dir(&self, path: &str) -> RemoteResult<Vec<FileStatus>> {
        tracing::debug!("WebHDFS LISTSTATUS: {}", path);
        let url = self.url(path, "LISTSTATUS", &[]);
        let resp = self.send(self.http.get(url), path).await?;
        let envelope: FileStatusesEnvelope = resp.json().await?;
        let entries = envelope.file_statuses.file_status;

        // Listing a file returns the file itself with an empty suffix
        if entries.len() == 1 && entries[0].path_suffix.is_empty() && entries[0].kind != "DIRECTORY" {
            return Err(RemoteError::exception("IOException", format!("Not a directory: {}", path)));
        }
        Ok(entries.into_iter().map(|s| s.into_status("")).collect())
    }

    async fn mkdir_all(&self, path: &str, mode: u32) -> RemoteResult<()> {
        tracing::debug!("WebHDFS MKDIRS: {} permission={:o}", path, mode);
        let url = self.url(path, "MKDIRS", &[("permission", format!("{:o}", mode))]);
        if self.boolean(self.http.put(url), path).await? {
            Ok(())
        } else {
            Err(RemoteError::exception("IOException", format!("mkdirs failed: {}", path)))
        }
    }
}

struct WebHdfsFileReader {
    client: WebHdfsClient,
    path: String,
    length: u64,
    pos: u64,
}

#[async_trait]
impl RemoteFileReader for WebHdfsFileReader {
    fn len(&self) -> u64 {
        self.length
    }

    async fn seek(&mut self, offset: u64) -> RemoteResult<u64> {
        self.pos = offset.min(self.length);
        Ok(self.pos)
    }

    fn into_stream(self: Box<Self>) -> BoxStream<'static, std::io::Result<Bytes>> {
        if self.pos >= self.length {
            return stream::empty().boxed();
        }
        let WebHdfsFileReader { client, path, pos, .. } = *self;
        let open = async move {
            tracing::debug!("WebHDFS OPEN: {} offset={}", path, pos);
            let url = client.url(&path, "OPEN", &[("offset", pos.to_string())]);
            let resp = client.stream_http.get(url).send().await.map_err(io_error)?;
            let resp = check(resp, &path).await.map_err(io_error)?;
            Ok::<_, std::io::Error>(resp.bytes_stream().map_err(io_error))
        };
        stream::once(open).try_flatten().boxed()
    }
}

struct WebHdfsFileWriter {
    client: WebHdfsClient,
    path: String,
    closed: bool,
}

impl WebHdfsFileWriter {
    fn new(client: WebHdfsClient, path: &str) -> Self {
        Self {
            client,
            path: path.to_string(),
            closed: false,
        }
    }
}

#[async_trait]
impl RemoteFileWriter for WebHdfsFileWriter {
    async fn write(&mut self, data: &[u8]) -> RemoteResult<()> {
        if self.closed {
            return Err(RemoteError::exception("IOException", "Stream closed"));
        }
        if data.is_empty() {
            return Ok(());
        }
        tracing::trace!("WebHDFS APPEND: {} ({} bytes)", self.path, data.len());
        let url = self.client.url(&self.path, "APPEND", &[]);
        let req = self
            .client
            .http
            .post(url)
            .header("Content-Type", "application/octet-stream")
            .body(Bytes::copy_from_slice(data));
        self.client.send(req, &self.path).await?;
        Ok(())
    }

    async fn close(&mut self) -> RemoteResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// Connects [`WebHdfsClient`]s and verifies the namenode answers / WebHDFS 连接器
#[derive(Debug, Default, Clone, Copy)]
pub struct WebHdfsConnector;

#[async_trait]
impl Connector for WebHdfsConnector {
    async fn connect(&self, params: &HdfsParameters) -> RemoteResult<Arc<dyn NameNodeClient>> {
        let client = WebHdfsClient::new(params)?;
        tracing::debug!("WebHDFS: connecting to {} as {}", client.base, client.user);
        client
            .stat("/")
            .await
            .map_err(|e| RemoteError::Connect(format!("{}: {}", client.base, e)))?;
        tracing::info!("WebHDFS: connected to {} as {}", client.base, client.user);
        Ok(Arc::new(client))
    }
}
