//! Multiverse – an aggregating list-view engine for the Rick and Morty catalog.
//!
//! The catalog serves three collections (characters, locations, episodes) in
//! fixed server pages of twenty. Multiverse turns each collection into a list
//! view that can be filtered on any supported field and paged at whatever size
//! the presentation wants:
//! * An [`aggregate::Aggregator`] drains every server page for the current
//!   server-side [`fetch::Constraints`] into one [`aggregate::Dataset`].
//! * [`filter::apply`] keeps the records matching a [`filter::FilterSpec`],
//!   using the per-kind predicate table in [`record::Record::FILTERS`].
//! * [`paginate::paginate`] slices the filtered records into display pages,
//!   clamping the requested page into range.
//! * A [`resolve::DetailResolver`] fetches the records a selected item refers
//!   to (a character's episodes, an episode's cast, a location's residents)
//!   concurrently, returning them in reference order.
//!
//! ## Modules
//! * [`record`] – The [`record::Record`] trait and the three record kinds.
//! * [`fetch`] – The [`fetch::Transport`] seam, its reqwest implementation and
//!   single-page fetching.
//! * [`aggregate`] – The page loop and the deduplicated dataset.
//! * [`filter`] – Predicate modes, field policies and filter specs.
//! * [`paginate`] – Display pagination state and slicing.
//! * [`resolve`] – Ordered, all-or-nothing cross-reference resolution.
//! * [`view`] – One view's state, the input-change controller and the
//!   aggregation epoch guard.
//! * [`config`] – Settings from defaults, file and environment.
//! * [`server`] – A small JSON surface over the three views.
//!
//! ## Staleness
//! Aggregations run without holding on to their view. Each one carries the
//! [`view::AggregationEpoch`] it was started under, and a view only installs
//! results from its latest epoch. An aggregation overtaken by a newer one is
//! discarded when it finishes, so the last request wins.
//!
//! ## Quick Start
//! ```no_run
//! use std::num::NonZeroUsize;
//! use std::time::Duration;
//! use multiverse::fetch::HttpTransport;
//! use multiverse::filter::FilterSpec;
//! use multiverse::record::Character;
//! use multiverse::view::View;
//! # async fn run() -> multiverse::error::Result<()> {
//! let transport = HttpTransport::new(Duration::from_secs(10))?;
//! let mut view: View<Character, _> = View::new(transport, "https://rickandmortyapi.com/api", NonZeroUsize::new(8).unwrap());
//! view.refresh().await?;
//! view.set_filter(FilterSpec::new().with("name", "rick").with("status", "alive"))?;
//! for character in view.page().items {
//!     println!("{} ({})", character.name, character.species);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod paginate;
pub mod record;
pub mod resolve;
pub mod server;
pub mod view;
