//! HTTP GET with a streamed response body.

use std::error::Error;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use minish_types::config::HttpConfig;
use minish_types::error::{HandlerError, Result, ShellError};

/// Response body delivered as a sequence of chunks.
pub type BodyStream = BoxStream<'static, std::result::Result<Bytes, HandlerError>>;

/// Status line plus a body that has not been read yet.
pub struct HttpResponse {
    /// Numeric HTTP status code.
    pub status: u16,
    /// Body chunks, pulled on demand.
    pub body: BodyStream,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Abstraction over an HTTP client that can issue GET requests.
///
/// The returned future resolves once response headers arrive; the body is
/// read lazily through [`HttpResponse::body`].
pub trait HttpClient: Send + Sync {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, std::result::Result<HttpResponse, HandlerError>>;
}

/// Render an error with its whole source chain (`reqwest` hides the useful
/// part, e.g. "connection refused", in the sources).
fn describe(err: &dyn Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !msg.contains(&cause_msg) {
            msg.push_str(": ");
            msg.push_str(&cause_msg);
        }
        source = cause.source();
    }
    msg
}

/// [`HttpClient`] backed by `reqwest`. Redirects are followed transparently.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ShellError::Config(format!("http client: {}", describe(&e))))?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> std::result::Result<HttpResponse, HandlerError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HandlerError::NetworkFailure(describe(&e)))?;
        let status = resp.status().as_u16();
        log::debug!("GET {url} -> {status}");
        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| HandlerError::NetworkFailure(describe(&e))))
            .boxed();
        Ok(HttpResponse { status, body })
    }
}

impl HttpClient for ReqwestClient {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, std::result::Result<HttpResponse, HandlerError>> {
        Box::pin(self.fetch(url))
    }
}
