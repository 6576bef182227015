//! Client-side filtering of an aggregated dataset.
//!
//! Every record kind publishes a fixed table of [`FieldPolicy`] entries (see
//! [`crate::record::Record::FILTERS`]). A [`FilterSpec`] carries the values the
//! presentation layer typed or selected for those fields; [`apply`] keeps the
//! records satisfying every active field, in their original order.

use std::collections::BTreeMap;

use crate::error::{MultiverseError, Result};
use crate::record::{Record, Ref};

/// How a single field is compared with its filter value. All modes ignore case
/// and surrounding whitespace of the filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateMode {
    /// Field value equals the filter value.
    Exact,
    /// Field value contains the filter value.
    Substring,
    /// Filter value is split on whitespace and every term must be contained.
    SubstringAllTerms,
}

impl PredicateMode {
    pub fn matches(&self, field_value: &str, filter_value: &str) -> bool {
        let haystack = field_value.to_lowercase();
        let wanted = filter_value.trim().to_lowercase();
        match self {
            PredicateMode::Exact => haystack == wanted,
            PredicateMode::Substring => haystack.contains(&wanted),
            PredicateMode::SubstringAllTerms => wanted.split_whitespace().all(|term| haystack.contains(term)),
        }
    }
}

/// One row of a record kind's predicate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub field: &'static str,
    pub mode: PredicateMode,
}

impl FieldPolicy {
    pub const fn new(field: &'static str, mode: PredicateMode) -> Self {
        Self { field, mode }
    }
}

/// Active client-side field constraints. Blank values impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    values: BTreeMap<String, String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }
    /// Builder style setter, used mostly by tests and the server.
    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.set(field, value);
        self
    }
    pub fn set(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.values.remove(field);
        } else {
            self.values.insert(field.to_string(), value.to_string());
        }
    }
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
    /// Rejects keys that are not part of `R`'s predicate table.
    pub fn validate<R: Record>(&self) -> Result<()> {
        for field in self.values.keys() {
            if !R::FILTERS.iter().any(|policy| policy.field == field) {
                return Err(MultiverseError::UnknownField {
                    collection: R::COLLECTION,
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}

/// True when `record` satisfies every active field of `spec`.
pub fn accepts<R: Record>(record: &R, spec: &FilterSpec) -> bool {
    R::FILTERS.iter().all(|policy| match spec.get(policy.field) {
        None => true,
        Some(wanted) => record
            .field(policy.field)
            .is_some_and(|actual| policy.mode.matches(actual, wanted)),
    })
}

/// Order-preserving subsequence of `dataset` accepted by `spec`.
pub fn apply<R: Record>(dataset: &[Ref<R>], spec: &FilterSpec) -> Vec<Ref<R>> {
    if spec.is_empty() {
        return dataset.to_vec();
    }
    dataset
        .iter()
        .filter(|record| accepts::<R>(record, spec))
        .cloned()
        .collect()
}
