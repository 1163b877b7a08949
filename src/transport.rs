use crate::error::{DashcamError, Result};
use crate::settings::ClientSettings;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Url, header::CONTENT_TYPE};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::Duration;

/// Lazy, single-pass sequence of body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

pub struct BufferedResponse {
    pub content_type: Option<String>,
    pub body: String,
}

pub struct StreamedResponse {
    pub content_type: Option<String>,
    pub body: ByteStream,
}

/// Request/response link to the device. No protocol semantics: callers encode
/// the parameters and decode the body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` with `params` in the given order and buffer the body.
    async fn exchange(&self, path: &str, params: &[(String, String)]) -> Result<BufferedResponse>;

    /// GET `path` and hand back the body as it arrives.
    async fn exchange_streamed(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<StreamedResponse>;

    /// Open the dedicated keepalive channel.
    async fn open_keepalive(&self) -> Result<Box<dyn KeepaliveLink>>;
}

#[async_trait]
pub trait KeepaliveLink: Send {
    async fn pulse(&mut self, payload: &[u8]) -> Result<()>;

    async fn close(&mut self);
}

pub struct HttpTransport {
    client: Client,
    base: Url,
    host: String,
    keepalive_port: u16,
    timeout: Duration,
    keepalive_timeout: Duration,
}

impl HttpTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let base = Url::parse(&settings.base_url())
            .map_err(|e| DashcamError::Transport(format!("Invalid dashcam address: {}", e)))?;
        let client = Client::builder()
            .build()
            .map_err(|e| DashcamError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            host: settings.host.clone(),
            keepalive_port: settings.keepalive_port,
            timeout: settings.http_timeout,
            keepalive_timeout: settings.keepalive_timeout,
        })
    }

    fn url(&self, path: &str, params: &[(String, String)]) -> Result<Url> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| DashcamError::Transport(format!("Invalid path {path:?}: {}", e)))?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send(&self, path: &str, params: &[(String, String)]) -> Result<reqwest::Response> {
        let url = self.url(path, params)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DashcamError::Transport(format!("Failed to send command: {}", e)))?;
        log::debug!("Sent dashcam command URL: {}", url);

        if !response.status().is_success() {
            return Err(DashcamError::Transport(format!(
                "Bad response to command: {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, path: &str, params: &[(String, String)]) -> Result<BufferedResponse> {
        let request = async {
            let response = self.send(path, params).await?;
            let content_type = content_type(&response);
            let body = response
                .text()
                .await
                .map_err(|e| DashcamError::Transport(format!("Failed to read response: {}", e)))?;
            Ok(BufferedResponse { content_type, body })
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| DashcamError::Transport("Timeout waiting for response".to_string()))?
    }

    async fn exchange_streamed(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<StreamedResponse> {
        // Only the headers are bounded; large files take as long as they take.
        let response = tokio::time::timeout(self.timeout, self.send(path, params))
            .await
            .map_err(|_| DashcamError::Transport("Timeout waiting for response".to_string()))??;

        let content_type = content_type(&response);
        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk.map_err(|e| DashcamError::Transport(format!("Failed to read response: {}", e)))
            })
            .boxed();
        Ok(StreamedResponse { content_type, body })
    }

    async fn open_keepalive(&self) -> Result<Box<dyn KeepaliveLink>> {
        let link = TcpKeepalive::connect(&self.host, self.keepalive_port, self.keepalive_timeout)
            .await?;
        Ok(Box::new(link))
    }
}

pub struct TcpKeepalive {
    stream: TcpStream,
    timeout: Duration,
}

impl TcpKeepalive {
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| DashcamError::Transport("Keepalive connection timeout".to_string()))?
            .map_err(|e| DashcamError::Transport(format!("Keepalive connection error: {}", e)))?;
        stream.set_nodelay(true)?;
        Ok(Self { stream, timeout })
    }
}

#[async_trait]
impl KeepaliveLink for TcpKeepalive {
    async fn pulse(&mut self, payload: &[u8]) -> Result<()> {
        tokio::time::timeout(self.timeout, async {
            self.stream.write_all(payload).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| DashcamError::Transport("Timeout sending keepalive".to_string()))??;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            log::debug!("Error closing keepalive socket: {}", e);
        }
    }
}
