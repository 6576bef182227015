//! Concurrent resolution of a record's cross-references.

use std::marker::PhantomData;

use futures_util::future::try_join_all;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetch::{Transport, decode_body};
use crate::record::Record;

/// Fetches detail records of kind `D` by URL.
pub struct DetailResolver<D, T> {
    transport: T,
    _kind: PhantomData<fn() -> D>,
}

impl<D, T: Clone> Clone for DetailResolver<D, T> {
    fn clone(&self) -> Self {
        Self { transport: self.transport.clone(), _kind: PhantomData }
    }
}

impl<D: Record, T: Transport> DetailResolver<D, T> {
    pub fn new(transport: T) -> Self {
        Self { transport, _kind: PhantomData }
    }

    pub async fn fetch_one(&self, url: &str) -> Result<D> {
        let resp = self.transport.get(url).await?;
        decode_body(url, resp)
    }

    /// Fires one request per reference at once and joins them. The output is
    /// in the order of `cross_refs`, whatever order the responses arrive in.
    /// A single failure fails the whole call.
    pub async fn resolve(&self, cross_refs: &[String]) -> Result<Vec<D>> {
        debug!(collection = D::COLLECTION, count = cross_refs.len(), "resolving cross-references");
        let fetches = cross_refs.iter().map(|url| self.fetch_one(url));
        try_join_all(fetches).await.inspect_err(|e| {
            warn!(collection = D::COLLECTION, error = %e, "cross-reference resolution failed");
        })
    }
}
