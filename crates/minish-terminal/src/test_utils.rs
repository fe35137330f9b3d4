//! Shared test helpers: a scripted HTTP client and environment builders.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream;
use tokio::sync::Notify;

use minish_net::http::BodyStream;
use minish_net::{HttpClient, HttpResponse};
use minish_types::config::ShellConfig;
use minish_types::error::HandlerError;
use minish_vfs::MemoryVfs;

use crate::interpreter::Environment;

/// Called with the index of each generated chunk just before it is yielded.
pub type ChunkProbe = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Clone)]
enum Body {
    Chunks(Vec<Bytes>),
    /// `count` chunks of `size` bytes, produced one at a time on demand.
    Generated {
        size: usize,
        count: usize,
        probe: ChunkProbe,
    },
    /// Some chunks, then a transport error.
    Truncated(Vec<Bytes>),
}

#[derive(Clone)]
struct Route {
    status: u16,
    body: Body,
    /// Response headers are held back until this is notified.
    gate: Option<Arc<Notify>>,
}

/// An [`HttpClient`] that answers from a fixed table of URLs. Unknown URLs
/// fail like an unresolvable host.
#[derive(Clone, Default)]
pub struct FakeHttp {
    routes: HashMap<String, Route>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, status: u16, chunks: &[&[u8]]) -> Self {
        let chunks = chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect();
        self.routes.insert(url.to_string(), Route {
            status,
            body: Body::Chunks(chunks),
            gate: None,
        });
        self
    }

    pub fn gated_route(mut self, url: &str, body: &[u8], gate: Arc<Notify>) -> Self {
        self.routes.insert(url.to_string(), Route {
            status: 200,
            body: Body::Chunks(vec![Bytes::copy_from_slice(body)]),
            gate: Some(gate),
        });
        self
    }

    pub fn generated_route(mut self, url: &str, size: usize, count: usize, probe: ChunkProbe) -> Self {
        self.routes.insert(url.to_string(), Route {
            status: 200,
            body: Body::Generated { size, count, probe },
            gate: None,
        });
        self
    }

    pub fn truncated_route(mut self, url: &str, chunks: &[&[u8]]) -> Self {
        let chunks = chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect();
        self.routes.insert(url.to_string(), Route {
            status: 200,
            body: Body::Truncated(chunks),
            gate: None,
        });
        self
    }
}

/// Deterministic content of generated chunk `index`.
pub fn generated_chunk(index: usize, size: usize) -> Vec<u8> {
    vec![(index % 251) as u8; size]
}

impl HttpClient for FakeHttp {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HandlerError>> {
        Box::pin(async move {
            let Some(route) = self.routes.get(url).cloned() else {
                return Err(HandlerError::NetworkFailure(format!(
                    "could not resolve host for {url}"
                )));
            };
            if let Some(gate) = &route.gate {
                gate.notified().await;
            }
            let body: BodyStream = match route.body {
                Body::Chunks(chunks) => stream::iter(chunks.into_iter().map(Ok)).boxed(),
                Body::Generated { size, count, probe } => stream::unfold(0, move |i| {
                    let probe = Arc::clone(&probe);
                    async move {
                        if i == count {
                            return None;
                        }
                        probe(i);
                        Some((Ok(Bytes::from(generated_chunk(i, size))), i + 1))
                    }
                })
                .boxed(),
                Body::Truncated(chunks) => stream::iter(chunks.into_iter().map(Ok))
                    .chain(stream::once(async {
                        Err(HandlerError::NetworkFailure("connection reset".to_string()))
                    }))
                    .boxed(),
            };
            Ok(HttpResponse {
                status: route.status,
                body,
            })
        })
    }
}

/// Environment over an in-memory filesystem and a scripted HTTP client.
pub fn env_with(vfs: MemoryVfs, http: FakeHttp) -> Environment {
    Environment::new(Arc::new(vfs), Arc::new(http), Arc::new(ShellConfig::default()))
}
