//! The lifecycle store façade

use crate::reducer::{LifecycleAction, LifecycleEnvironment, LifecycleReducer};
use crate::state::{AnalysisState, LifecycleState};
use dymis_core::{AnalysisError, AnalysisExecutor, AnalysisRequest, AnalysisResult};
use dymis_runtime::{EffectHandle, Store, Subscription};
use std::sync::Arc;
use tokio::sync::watch;

/// Handle returned by [`LifecycleStore::subscribe`]
pub type LifecycleSubscription = Subscription<AnalysisState>;

type InnerStore = Store<AnalysisState, LifecycleAction, LifecycleEnvironment, LifecycleReducer>;

/// Error shown when `submit` is called outside a tokio runtime
pub const NO_RUNTIME_MESSAGE: &str = "No async runtime available to run the analysis request";

/// Observable holder of one [`LifecycleState`]
///
/// Constructed explicitly and shared by cloning; every clone refers to the
/// same state. All mutation goes through the transition methods, and every
/// transition is delivered to subscribers as one complete state.
///
/// Two ways to drive it:
///
/// - call [`begin`](Self::begin), run a request yourself, then
///   [`succeed`](Self::succeed) or [`fail`](Self::fail);
/// - or [`submit`](Self::submit) content and let the store run the injected
///   executor, ignoring outcomes that a newer submission or a reset has
///   superseded.
#[derive(Clone)]
pub struct LifecycleStore {
    store: InnerStore,
    view: Arc<watch::Sender<LifecycleState>>,
}

impl LifecycleStore {
    /// Create a store in the idle state around `executor`
    #[must_use]
    pub fn new(executor: impl AnalysisExecutor + 'static) -> Self {
        Self::with_executor(Arc::new(executor))
    }

    /// Create a store around a shared executor
    #[must_use]
    pub fn with_executor(executor: Arc<dyn AnalysisExecutor>) -> Self {
        let store = Store::new(
            AnalysisState::default(),
            LifecycleReducer,
            LifecycleEnvironment::new(executor),
        );

        let (view, _) = watch::channel(LifecycleState::idle());
        let view = Arc::new(view);
        let feed = Arc::clone(&view);
        // Registered for the lifetime of the store
        let _feed = store.subscribe(move |state: &AnalysisState| {
            feed.send_replace(state.lifecycle().clone());
        });

        Self { store, view }
    }

    /// Enter loading, clearing any result or error
    pub fn begin(&self) {
        self.store.send(LifecycleAction::Begin);
    }

    /// Settle with `results`
    pub fn succeed(&self, results: AnalysisResult) {
        self.store.send(LifecycleAction::Succeed(results));
    }

    /// Settle with an error message
    pub fn fail(&self, error: impl Into<String>) {
        self.store.send(LifecycleAction::Fail(Some(error.into())));
    }

    /// Leave loading and drop results without recording an error
    pub fn clear_error(&self) {
        self.store.send(LifecycleAction::Fail(None));
    }

    /// Return to the initial state
    ///
    /// Outstanding submissions are not cancelled, but their outcomes are
    /// discarded when they arrive.
    pub fn reset(&self) {
        self.store.send(LifecycleAction::Reset);
    }

    /// Enter loading and analyze `content` with the injected executor
    ///
    /// Returns once loading is visible to subscribers; the handle resolves
    /// after the outcome has been applied (or discarded as stale). Blank
    /// content fails immediately without entering loading.
    ///
    /// Outside a tokio runtime no request can be started, so the submission
    /// fails at once with a transport error instead of loading forever.
    pub fn submit(&self, content: impl Into<String>) -> EffectHandle {
        let content = content.into();

        if tokio::runtime::Handle::try_current().is_err() {
            let error = AnalysisRequest::new(&content)
                .err()
                .unwrap_or_else(|| AnalysisError::transport(NO_RUNTIME_MESSAGE));
            return self.store.send(LifecycleAction::Reject(error));
        }

        self.store.send(LifecycleAction::Submit { content })
    }

    /// Submit `content` and wait for it to settle
    ///
    /// Returns the state current after settlement, which is a newer request's
    /// state if this one was superseded meanwhile.
    pub async fn analyze(&self, content: impl Into<String>) -> LifecycleState {
        self.submit(content).wait().await;
        self.current()
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn current(&self) -> LifecycleState {
        self.store.state(|s| s.lifecycle().clone())
    }

    /// Register an observer
    ///
    /// The callback receives the current state immediately, then every new
    /// state synchronously and in registration order. Callbacks may read the
    /// store ([`current`](Self::current), [`watch`](Self::watch)) but must not
    /// call transition methods or `subscribe` on it.
    pub fn subscribe<F>(&self, callback: F) -> LifecycleSubscription
    where
        F: Fn(&LifecycleState) + Send + Sync + 'static,
    {
        self.store.subscribe(move |state: &AnalysisState| callback(state.lifecycle()))
    }

    /// Number of registered observers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        // Minus the feed behind `watch`
        self.store.subscriber_count().saturating_sub(1)
    }

    /// Receiver holding the latest state, for async consumers
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<LifecycleState> {
        self.view.subscribe()
    }
}

impl std::fmt::Debug for LifecycleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleStore")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}
