//! Lifecycle transitions

use crate::state::{AnalysisState, LifecycleState};
use dymis_core::{
    AnalysisError, AnalysisExecutor, AnalysisRequest, AnalysisResult, SmallVec, effect::Effect,
    reducer::Reducer, smallvec,
};
use std::sync::Arc;

/// Inputs to the lifecycle reducer
#[derive(Clone, Debug)]
pub enum LifecycleAction {
    /// Enter loading, discarding any previous result or error
    Begin,
    /// Settle with a result
    Succeed(AnalysisResult),
    /// Settle with an error message, or clear the error with `None`
    Fail(Option<String>),
    /// Return to the initial state
    Reset,
    /// Enter loading and run the executor for `content`
    Submit {
        /// Content to analyze
        content: String,
    },
    /// Fail a submission that could not start, superseding any request in flight
    Reject(AnalysisError),
    /// Outcome of a submitted request, tagged with the generation it started under
    Settle {
        /// Generation current when the request was submitted
        generation: u64,
        /// What the executor returned
        outcome: Result<AnalysisResult, AnalysisError>,
    },
}

/// Injected dependencies for the lifecycle reducer
#[derive(Clone)]
pub struct LifecycleEnvironment {
    /// Performs submitted requests
    pub executor: Arc<dyn AnalysisExecutor>,
}

impl LifecycleEnvironment {
    /// Create an environment around an executor
    #[must_use]
    pub fn new(executor: Arc<dyn AnalysisExecutor>) -> Self {
        Self { executor }
    }
}

impl std::fmt::Debug for LifecycleEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleEnvironment").finish_non_exhaustive()
    }
}

/// Lifecycle reducer
///
/// `Begin`, `Succeed`, `Fail` and `Reset` are accepted from every state and
/// overwrite all three rendered fields at once. Only `Settle` is fenced by
/// generation; a stale one does not apply at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct LifecycleReducer;

impl Reducer for LifecycleReducer {
    type State = AnalysisState;
    type Action = LifecycleAction;
    type Environment = LifecycleEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            LifecycleAction::Begin => {
                state.next_generation();
                state.lifecycle = LifecycleState::loading();
            },
            LifecycleAction::Succeed(results) => {
                state.lifecycle = LifecycleState::succeeded(results);
            },
            LifecycleAction::Fail(error) => {
                state.lifecycle = LifecycleState::failed(error);
            },
            LifecycleAction::Reset => {
                state.next_generation();
                state.lifecycle = LifecycleState::idle();
            },
            LifecycleAction::Submit { content } => {
                if let Err(error) = AnalysisRequest::new(&content) {
                    reject(state, error);
                    return smallvec![Effect::None];
                }

                let generation = state.next_generation();
                state.lifecycle = LifecycleState::loading();
                tracing::debug!(generation, content_len = content.len(), "Analysis submitted");

                let executor = Arc::clone(&env.executor);
                return smallvec![Effect::future(async move {
                    let outcome = executor.execute(&content).await;
                    Some(LifecycleAction::Settle { generation, outcome })
                })];
            },
            LifecycleAction::Reject(error) => reject(state, error),
            LifecycleAction::Settle {
                generation,
                outcome,
            } => {
                if generation != state.generation {
                    tracing::debug!(
                        generation,
                        current = state.generation,
                        "Discarding outcome of superseded request"
                    );
                    return smallvec![Effect::None];
                }

                state.lifecycle = match outcome {
                    Ok(results) => LifecycleState::succeeded(results),
                    Err(error) => {
                        tracing::warn!(kind = %error.kind(), error = %error, "Analysis failed");
                        LifecycleState::failed(Some(error.into_message()))
                    },
                };
            },
        }

        smallvec![Effect::None]
    }

    fn applies(&self, state: &Self::State, action: &Self::Action) -> bool {
        match action {
            LifecycleAction::Settle { generation, .. } => *generation == state.generation,
            _ => true,
        }
    }
}

fn reject(state: &mut AnalysisState, error: AnalysisError) {
    tracing::warn!(kind = %error.kind(), error = %error, "Analysis rejected before starting");
    state.next_generation();
    state.lifecycle = LifecycleState::failed(Some(error.into_message()));
}
