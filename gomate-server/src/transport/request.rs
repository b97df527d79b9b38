//! Request descriptors and the upstream seam.
//!
//! Resolvers describe what they want to fetch as [`UpstreamRequest`] values
//! and hand them to an [`Upstream`]. The HTTP implementation lives in
//! `client.rs`; tests substitute a canned one.

use std::fmt;
use std::future::Future;

use serde_json::Value;

use super::error::TransportError;

/// One GET against the transport API, relative to its base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Path segments below the base URL, unescaped.
    pub segments: Vec<String>,

    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
}

impl UpstreamRequest {
    /// A request for the given path segments and no query.
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// Something that can execute an [`UpstreamRequest`] and return its JSON body.
///
/// A successful return means a 2xx status and a decodable body; everything
/// else is a [`TransportError`].
pub trait Upstream: Send + Sync {
    fn get(
        &self,
        request: &UpstreamRequest,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

impl<U: Upstream> Upstream for std::sync::Arc<U> {
    fn get(
        &self,
        request: &UpstreamRequest,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        (**self).get(request)
    }
}
