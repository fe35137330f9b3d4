//! Networking for minish.
//!
//! The [`HttpClient`] trait is the capability the `wget` command consumes;
//! [`ReqwestClient`] is the production implementation.

pub mod http;

/// HTTP GET capability.
pub use http::HttpClient;
/// Response status plus a streamed body.
pub use http::HttpResponse;
/// `reqwest`-backed client.
pub use http::ReqwestClient;
