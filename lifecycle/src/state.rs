//! Lifecycle state and the reducer state wrapping it

use dymis_core::AnalysisResult;
use serde::Serialize;

/// Coarse lifecycle phase derived from a [`LifecycleState`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing in flight, nothing to show
    Idle,
    /// A request is in flight
    Loading,
    /// The last request produced a result
    Succeeded,
    /// The last request failed
    Failed,
}

/// What a presentation layer renders
///
/// At most one of `error` and `results` is set, and neither is set while
/// loading. The fields are private and every constructor upholds this, so a
/// value that breaks it cannot exist.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleState {
    is_loading: bool,
    error: Option<String>,
    results: Option<AnalysisResult>,
}

impl LifecycleState {
    /// The initial state: not loading, no error, no results
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            is_loading: false,
            error: None,
            results: None,
        }
    }

    /// A request is in flight
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            is_loading: true,
            error: None,
            results: None,
        }
    }

    /// Settled with a result
    #[must_use]
    pub const fn succeeded(results: AnalysisResult) -> Self {
        Self {
            is_loading: false,
            error: None,
            results: Some(results),
        }
    }

    /// Settled with an error; `None` clears the error without showing results
    #[must_use]
    pub const fn failed(error: Option<String>) -> Self {
        Self {
            is_loading: false,
            error,
            results: None,
        }
    }

    /// Whether a request is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Error message to render verbatim
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Result of the last successful request
    #[must_use]
    pub const fn results(&self) -> Option<&AnalysisResult> {
        self.results.as_ref()
    }

    /// Whether this equals the initial state
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.is_loading && self.error.is_none() && self.results.is_none()
    }

    /// The phase this state encodes
    #[must_use]
    pub fn phase(&self) -> Phase {
        match (self.is_loading, &self.error, &self.results) {
            (true, _, _) => Phase::Loading,
            (false, Some(_), _) => Phase::Failed,
            (false, None, Some(_)) => Phase::Succeeded,
            (false, None, None) => Phase::Idle,
        }
    }
}

/// Reducer state: the rendered lifecycle plus the request generation
///
/// The generation increases on every `Begin`, `Submit`, `Reject` and `Reset`. Outcomes
/// of submitted requests carry the generation they were started under and
/// are discarded once it is no longer current.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisState {
    pub(crate) lifecycle: LifecycleState,
    pub(crate) generation: u64,
}

impl AnalysisState {
    /// Build a state directly, mainly for reducer tests
    #[must_use]
    pub const fn new(lifecycle: LifecycleState, generation: u64) -> Self {
        Self {
            lifecycle,
            generation,
        }
    }

    /// The rendered lifecycle
    #[must_use]
    pub const fn lifecycle(&self) -> &LifecycleState {
        &self.lifecycle
    }

    /// The current request generation
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}
