//! Drains a server-paginated collection into one complete [`Dataset`].

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::Result;
use crate::fetch::{Constraints, PageFetcher, Transport};
use crate::record::{Record, RecordId, Ref};

/// Every record fetched for one constraint set, each id once, in first-seen
/// server order.
#[derive(Debug)]
pub struct Dataset<R> {
    records: Vec<Ref<R>>,
}

impl<R> Default for Dataset<R> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<R: Record> Dataset<R> {
    pub fn empty() -> Self {
        Self::default()
    }
    /// Builds a dataset, dropping repeated ids after their first appearance.
    pub fn from_records(records: impl IntoIterator<Item = R>) -> Self {
        let mut seen = HashSet::<RecordId>::new();
        let records = records
            .into_iter()
            .filter(|r| seen.insert(r.id()))
            .map(Ref::new)
            .collect();
        Self { records }
    }
    pub fn records(&self) -> &[Ref<R>] {
        &self.records
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn get(&self, id: RecordId) -> Option<&Ref<R>> {
        self.records.iter().find(|r| r.id() == id)
    }
}

/// Sequential page loop over a [`PageFetcher`].
pub struct Aggregator<R, T> {
    fetcher: PageFetcher<R, T>,
}

impl<R, T: Clone> Clone for Aggregator<R, T> {
    fn clone(&self) -> Self {
        Self { fetcher: self.fetcher.clone() }
    }
}

impl<R: Record, T: Transport> Aggregator<R, T> {
    pub fn new(fetcher: PageFetcher<R, T>) -> Self {
        Self { fetcher }
    }
    /// Requests page 1, 2, … until a page reports no continuation. The first
    /// failing page aborts the run; nothing gathered so far is returned.
    pub async fn fetch_all(&self, constraints: &Constraints) -> Result<Dataset<R>> {
        let mut accumulated = Vec::new();
        let mut page = 1;
        loop {
            let envelope = self.fetcher.fetch_page(page, constraints).await?;
            debug!(collection = R::COLLECTION, page, items = envelope.items.len(), has_next = envelope.has_next, "page received");
            accumulated.extend(envelope.items);
            if !envelope.has_next {
                break;
            }
            page += 1;
        }
        let received = accumulated.len();
        let dataset = Dataset::from_records(accumulated);
        if dataset.len() < received {
            debug!(collection = R::COLLECTION, dropped = received - dataset.len(), "duplicate ids dropped");
        }
        info!(collection = R::COLLECTION, pages = page, records = dataset.len(), "aggregation complete");
        Ok(dataset)
    }
}
