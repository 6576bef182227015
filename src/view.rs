//! The engine behind one list view.
//!
//! A [`View`] owns the dataset, the active filter and the pagination cursor of
//! one record kind. Inputs change only through [`View::update`] (or the small
//! setters built on it), which asks the pure [`plan`] function what the change
//! requires:
//!
//! * new server-side constraints (or no usable dataset yet) → aggregate again,
//! * a new filter → re-apply it to the dataset and return to page 1,
//! * a new page or page size → re-slice only.
//!
//! Aggregation is split into three steps so the view never has to stay
//! borrowed while the network is awaited: [`View::reload`] bumps the
//! [`AggregationEpoch`] and hands out a [`PendingAggregation`], the caller runs
//! it, and [`View::apply`] installs the result only if no newer aggregation has
//! been started in the meantime. Results from older epochs are dropped. An
//! aggregation dropped before reaching [`View::apply`] hands the view back to
//! [`LoadStatus::Idle`].

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::aggregate::{Aggregator, Dataset};
use crate::error::{MultiverseError, Result};
use crate::fetch::{Constraints, PageFetcher, Transport};
use crate::filter::{self, FilterSpec};
use crate::paginate::{PageSlice, PaginationState, paginate};
use crate::record::{Record, RecordId, Ref};
use crate::resolve::DetailResolver;

/// Everything the presentation layer can change about a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewInputs {
    pub constraints: Constraints,
    pub filter: FilterSpec,
    pub pagination: PaginationState,
}

impl ViewInputs {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            constraints: Constraints::new(),
            filter: FilterSpec::new(),
            pagination: PaginationState::new(page_size),
        }
    }
}

/// What an input change requires, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FetchAll,
    Reapply,
    Repaginate,
    Nothing,
}

/// Decides the work needed to go from `current` to `next`. `needs_dataset` is
/// true while the view has no dataset it could filter (never loaded, or the
/// last aggregation failed).
pub fn plan(current: &ViewInputs, next: &ViewInputs, needs_dataset: bool) -> Action {
    if needs_dataset || current.constraints != next.constraints {
        Action::FetchAll
    } else if current.filter != next.filter {
        Action::Reapply
    } else if current.pagination != next.pagination {
        Action::Repaginate
    } else {
        Action::Nothing
    }
}

/// Generation of the most recently started aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregationEpoch(u64);

impl AggregationEpoch {
    pub fn value(&self) -> u64 {
        self.0
    }
    fn advance(&mut self) -> Self {
        self.0 += 1;
        *self
    }
}

impl fmt::Display for AggregationEpoch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the view's dataset came from. `Empty` and `Failed` both present as no
/// records; the distinction is kept for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Empty,
    Failed,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Idle => "idle",
            LoadStatus::Loading => "loading",
            LoadStatus::Ready => "ready",
            LoadStatus::Empty => "empty",
            LoadStatus::Failed => "failed",
        }
    }
}

/// Result of handing a finished aggregation back to its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Discarded,
}

/// Travels with an aggregation from [`View::reload`] to [`View::apply`]. If it
/// is dropped on the way (the caller went away mid-fetch) its epoch is recorded
/// as abandoned, so the view knows no result is coming.
struct Ticket {
    epoch: AggregationEpoch,
    abandoned: Arc<AtomicU64>,
    armed: bool,
}

impl Ticket {
    fn redeem(mut self) {
        self.armed = false;
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if self.armed {
            self.abandoned.fetch_max(self.epoch.value(), Ordering::SeqCst);
        }
    }
}

/// An aggregation started by [`View::reload`], not yet run.
pub struct PendingAggregation<R, T> {
    ticket: Ticket,
    constraints: Constraints,
    aggregator: Aggregator<R, T>,
}

impl<R: Record, T: Transport> PendingAggregation<R, T> {
    pub fn epoch(&self) -> AggregationEpoch {
        self.ticket.epoch
    }
    pub async fn run(self) -> CompletedAggregation<R> {
        let PendingAggregation { ticket, constraints, aggregator } = self;
        let outcome = aggregator.fetch_all(&constraints).await;
        CompletedAggregation { ticket, outcome }
    }
}

/// A finished aggregation waiting for [`View::apply`].
pub struct CompletedAggregation<R> {
    ticket: Ticket,
    outcome: Result<Dataset<R>>,
}

impl<R> CompletedAggregation<R> {
    pub fn epoch(&self) -> AggregationEpoch {
        self.ticket.epoch
    }
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Cross-references of one selected record, ready to be resolved without
/// holding on to the view.
pub struct DetailRequest<D, T> {
    refs: Vec<String>,
    resolver: DetailResolver<D, T>,
}

impl<D: Record, T: Transport> DetailRequest<D, T> {
    pub fn refs(&self) -> &[String] {
        &self.refs
    }
    pub async fn run(self) -> Result<Vec<D>> {
        self.resolver.resolve(&self.refs).await
    }
}

pub struct View<R: Record, T: Transport> {
    aggregator: Aggregator<R, T>,
    resolver: DetailResolver<R::Detail, T>,
    inputs: ViewInputs,
    epoch: AggregationEpoch,
    abandoned: Arc<AtomicU64>,
    status: LoadStatus,
    last_error: Option<String>,
    dataset: Ref<Dataset<R>>,
    filtered: Vec<Ref<R>>,
}

impl<R: Record, T: Transport> View<R, T> {
    pub fn new(transport: T, base_url: &str, page_size: NonZeroUsize) -> Self {
        let fetcher = PageFetcher::new(transport.clone(), base_url);
        Self {
            aggregator: Aggregator::new(fetcher),
            resolver: DetailResolver::new(transport),
            inputs: ViewInputs::new(page_size),
            epoch: AggregationEpoch::default(),
            abandoned: Arc::new(AtomicU64::new(0)),
            status: LoadStatus::Idle,
            last_error: None,
            dataset: Ref::new(Dataset::empty()),
            filtered: Vec::new(),
        }
    }

    // ------------- Reading -------------
    pub fn inputs(&self) -> &ViewInputs {
        &self.inputs
    }
    pub fn epoch(&self) -> AggregationEpoch {
        self.epoch
    }
    /// A view whose live aggregation was dropped before being applied reports
    /// `Idle` again.
    pub fn status(&self) -> LoadStatus {
        if self.status == LoadStatus::Loading && self.live_abandoned() {
            LoadStatus::Idle
        } else {
            self.status
        }
    }
    /// Message of the failure that emptied the view, if that is what happened.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
    pub fn dataset(&self) -> Ref<Dataset<R>> {
        Ref::clone(&self.dataset)
    }
    pub fn filtered(&self) -> &[Ref<R>] {
        &self.filtered
    }
    pub fn page(&self) -> PageSlice<'_, Ref<R>> {
        paginate(&self.filtered, self.inputs.pagination)
    }
    pub fn record(&self, id: RecordId) -> Option<Ref<R>> {
        self.dataset.get(id).cloned()
    }
    fn live_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst) == self.epoch.value()
    }
    fn needs_dataset(&self) -> bool {
        matches!(self.status(), LoadStatus::Idle | LoadStatus::Failed)
    }

    // ------------- Input changes -------------
    /// Moves the view to `next`, doing whatever [`plan`] asks for. When an
    /// aggregation is required it is returned for the caller to run.
    pub fn update(&mut self, next: ViewInputs) -> Result<Option<PendingAggregation<R, T>>> {
        next.filter.validate::<R>()?;
        let action = plan(&self.inputs, &next, self.needs_dataset());
        debug!(collection = R::COLLECTION, ?action, "view input change");
        match action {
            Action::FetchAll => {
                self.inputs = ViewInputs { pagination: next.pagination.reset(), ..next };
                return Ok(Some(self.reload()));
            }
            Action::Reapply => {
                self.inputs = ViewInputs { pagination: next.pagination.reset(), ..next };
                self.refilter();
            }
            Action::Repaginate => {
                self.inputs.pagination = next.pagination.clamped(self.filtered.len());
            }
            Action::Nothing => {}
        }
        Ok(None)
    }
    pub fn set_constraints(&mut self, constraints: Constraints) -> Result<Option<PendingAggregation<R, T>>> {
        let next = ViewInputs { constraints, ..self.inputs.clone() };
        self.update(next)
    }
    pub fn set_filter(&mut self, filter: FilterSpec) -> Result<Option<PendingAggregation<R, T>>> {
        let next = ViewInputs { filter, ..self.inputs.clone() };
        self.update(next)
    }
    pub fn set_page(&mut self, page: usize) -> Result<Option<PendingAggregation<R, T>>> {
        let next = ViewInputs { pagination: self.inputs.pagination.with_page(page), ..self.inputs.clone() };
        self.update(next)
    }
    pub fn set_page_size(&mut self, page_size: NonZeroUsize) -> Result<Option<PendingAggregation<R, T>>> {
        let next = ViewInputs { pagination: self.inputs.pagination.with_page_size(page_size), ..self.inputs.clone() };
        self.update(next)
    }

    // ------------- Aggregation -------------
    /// Starts a new aggregation for the current constraints. Any aggregation
    /// started before this one becomes stale.
    pub fn reload(&mut self) -> PendingAggregation<R, T> {
        let epoch = self.epoch.advance();
        self.status = LoadStatus::Loading;
        debug!(collection = R::COLLECTION, %epoch, "aggregation started");
        PendingAggregation {
            ticket: Ticket { epoch, abandoned: Arc::clone(&self.abandoned), armed: true },
            constraints: self.inputs.constraints.clone(),
            aggregator: self.aggregator.clone(),
        }
    }

    /// Installs a finished aggregation if it is still the latest one. A failure
    /// of the latest aggregation empties the view and is returned; stale
    /// results, failed or not, are dropped without a trace in the view.
    pub fn apply(&mut self, done: CompletedAggregation<R>) -> Result<ApplyOutcome> {
        let CompletedAggregation { ticket, outcome } = done;
        let epoch = ticket.epoch;
        ticket.redeem();
        if epoch != self.epoch {
            debug!(collection = R::COLLECTION, stale = %epoch, live = %self.epoch, "stale aggregation discarded");
            return Ok(ApplyOutcome::Discarded);
        }
        self.inputs.pagination = self.inputs.pagination.reset();
        match outcome {
            Ok(dataset) => {
                self.status = if dataset.is_empty() { LoadStatus::Empty } else { LoadStatus::Ready };
                self.last_error = None;
                self.dataset = Ref::new(dataset);
                self.refilter();
                info!(collection = R::COLLECTION, epoch = %epoch, records = self.dataset.len(), shown = self.filtered.len(), "dataset replaced");
                Ok(ApplyOutcome::Applied)
            }
            Err(e) => {
                warn!(collection = R::COLLECTION, epoch = %epoch, error = %e, "aggregation failed, view emptied");
                self.status = LoadStatus::Failed;
                self.last_error = Some(e.to_string());
                self.dataset = Ref::new(Dataset::empty());
                self.refilter();
                Err(e)
            }
        }
    }

    /// Reload, run and apply in one go, for callers that own the view.
    pub async fn refresh(&mut self) -> Result<ApplyOutcome> {
        let done = self.reload().run().await;
        self.apply(done)
    }

    fn refilter(&mut self) {
        self.filtered = filter::apply(self.dataset.records(), &self.inputs.filter);
    }

    // ------------- Details -------------
    /// Prepares resolution of the cross-references of record `id`.
    pub fn details(&self, id: RecordId) -> Result<DetailRequest<R::Detail, T>> {
        let record = self
            .dataset
            .get(id)
            .ok_or(MultiverseError::UnknownRecord { collection: R::COLLECTION, id })?;
        Ok(DetailRequest { refs: record.cross_refs().to_vec(), resolver: self.resolver.clone() })
    }
}
