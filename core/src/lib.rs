//! # Dymis Core
//!
//! Core traits and types for the Dymis analysis client.
//!
//! This crate has no I/O of its own. It defines the vocabulary shared by the
//! HTTP client, the store runtime and the lifecycle feature:
//!
//! - **Analysis types**: the request sent to the service and the result it returns
//! - **Errors**: the four failure kinds a request can end in
//! - **Executor**: the seam through which a request is actually performed
//! - **Reducer / Effect**: pure state transitions plus descriptions of async work
//!
//! ## Example
//!
//! ```ignore
//! use dymis_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for LifecycleReducer {
//!     type State = AnalysisState;
//!     type Action = LifecycleAction;
//!     type Environment = LifecycleEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut AnalysisState,
//!         action: LifecycleAction,
//!         env: &LifecycleEnvironment,
//!     ) -> SmallVec<[Effect<LifecycleAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

pub mod analysis;
pub mod error;
pub mod executor;

pub use analysis::{AnalysisRequest, AnalysisResult, EducationalBreakdown};
pub use error::{AnalysisError, ErrorKind};
pub use executor::AnalysisExecutor;
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - the core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never perform I/O themselves; async work is described by the returned
/// effects and executed by the runtime.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns the effects the runtime
        /// should execute afterwards.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;

        /// Whether `action` is a transition of `state` at all
        ///
        /// The runtime neither reduces nor notifies observers for actions
        /// rejected here. Defaults to accepting everything.
        fn applies(&self, _state: &Self::State, _action: &Self::Action) -> bool {
            true
        }
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values returned from reducers, not execution. The runtime
/// decides when and where they run.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async block as an effect
        #[must_use]
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}
