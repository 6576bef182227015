//! One-request building blocks: the [`Transport`] seam, the HTTP implementation
//! and the [`PageFetcher`] that turns a collection page into a [`PageEnvelope`].

use std::collections::BTreeMap;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{MultiverseError, Result};
use crate::record::Record;

/// Status and body of a completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests. Cloning must be cheap; every in-flight aggregation and
/// detail fan-out holds its own clone.
pub trait Transport: Clone + Send + Sync + 'static {
    fn get(&self, url: &str) -> impl Future<Output = Result<RawResponse>> + Send;
}

#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }
}

/// Decodes a successful body, mapping failures to `Decode` and non-success
/// statuses to `Status`.
pub fn decode_body<T: DeserializeOwned>(url: &str, resp: RawResponse) -> Result<T> {
    if !resp.is_success() {
        return Err(MultiverseError::Status { url: url.to_string(), status: resp.status });
    }
    serde_json::from_str(&resp.body).map_err(|e| MultiverseError::decode(url, e.to_string()))
}

/// Server-side field constraints sent as query parameters with every page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Constraints {
    params: BTreeMap<String, String>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.set(field, value);
        self
    }
    pub fn set(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.params.remove(field);
        } else {
            self.params.insert(field.to_string(), value.to_string());
        }
    }
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ------------- Wire format -------------
#[derive(Debug, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub pages: u32,
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "R: DeserializeOwned")]
pub struct ApiPage<R> {
    pub info: PageInfo,
    pub results: Vec<R>,
}

/// Body the catalog sends with a 404 when nothing matches the constraints.
#[derive(Debug, Deserialize)]
struct ApiNothingHere {
    error: String,
}

/// One server page: its items and whether another page follows.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEnvelope<R> {
    pub items: Vec<R>,
    pub has_next: bool,
}

impl<R> PageEnvelope<R> {
    pub fn empty() -> Self {
        Self { items: Vec::new(), has_next: false }
    }
}

impl<R> From<ApiPage<R>> for PageEnvelope<R> {
    fn from(page: ApiPage<R>) -> Self {
        Self { items: page.results, has_next: page.info.next.is_some() }
    }
}

/// Fetches single pages of `R`'s collection.
pub struct PageFetcher<R, T> {
    transport: T,
    base_url: String,
    _kind: PhantomData<fn() -> R>,
}

impl<R, T: Clone> Clone for PageFetcher<R, T> {
    fn clone(&self) -> Self {
        Self { transport: self.transport.clone(), base_url: self.base_url.clone(), _kind: PhantomData }
    }
}

impl<R: Record, T: Transport> PageFetcher<R, T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self { transport, base_url: base_url.trim_end_matches('/').to_string(), _kind: PhantomData }
    }
    pub fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, R::COLLECTION)
    }
    /// `<base>/<collection>?page=<N>&<field>=<value>…`
    pub fn page_url(&self, page: u32, constraints: &Constraints) -> Result<String> {
        let base = self.collection_url();
        let page = page.to_string();
        let params = std::iter::once(("page", page.as_str())).chain(constraints.iter());
        Url::parse_with_params(&base, params)
            .map(String::from)
            .map_err(|e| MultiverseError::transport(&base, e.to_string()))
    }
    pub async fn fetch_page(&self, page: u32, constraints: &Constraints) -> Result<PageEnvelope<R>> {
        let url = self.page_url(page, constraints)?;
        let resp = self.transport.get(&url).await?;
        // "nothing here" means an empty result only on the first page
        if resp.status == 404 && page == 1 {
            if let Ok(nothing) = serde_json::from_str::<ApiNothingHere>(&resp.body) {
                debug!(%url, reason = %nothing.error, "no records match constraints");
                return Ok(PageEnvelope::empty());
            }
        }
        let page: ApiPage<R> = decode_body(&url, resp)?;
        Ok(page.into())
    }
}
