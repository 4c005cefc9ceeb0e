//! # Dymis Runtime
//!
//! Store runtime that applies reducer transitions atomically and broadcasts
//! every new state to its observers.
//!
//! ## Core Components
//!
//! - **Store**: owns the state, runs the reducer, notifies subscribers
//! - **Subscription**: handle returned by [`Store::subscribe`], used to stop notifications
//! - **`EffectHandle`**: waits for the async effects started by a [`Store::send`]
//!
//! ## Example
//!
//! ```ignore
//! use dymis_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Observers get the current state immediately, then every transition
//! let subscription = store.subscribe(|state| println!("{state:?}"));
//!
//! // Send an action and wait for the effects it started
//! store.send(Action::DoSomething).wait().await;
//!
//! subscription.unsubscribe();
//! ```

use dymis_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Metrics for observability
pub mod metrics;

use metrics::{EffectMetrics, ReducerMetrics, SubscriberMetrics};

/// Lock a mutex, recovering the data if a previous holder panicked
///
/// State is only ever replaced wholesale by the reducer, so a poisoned lock
/// still guards a consistent value.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for waiting on the effects started by one [`Store::send`]
///
/// Effects that feed actions back into the store are followed transitively:
/// `wait()` returns only once those follow-up transitions have completed too.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        Self::new().0
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ())
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: counter shared between a handle and the effects it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            self.notifier.send_replace(());
        }
    }
}

/// Internal: decrements the effect counter on drop, even if the effect panics
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

type Callback<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Registered observers, kept in registration order
struct Subscribers<S> {
    next_id: u64,
    entries: Vec<(u64, Callback<S>)>,
}

impl<S> Subscribers<S> {
    const fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    fn insert(&mut self, callback: Callback<S>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, callback));
        SubscriberMetrics::record_count(self.entries.len());
        id
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        SubscriberMetrics::record_count(self.entries.len());
        self.entries.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    fn snapshot(&self) -> Vec<(u64, Callback<S>)> {
        self.entries
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect()
    }
}

/// A registered observer
///
/// Holds only a weak reference to the store's subscriber list, so keeping a
/// subscription alive never keeps the store alive. Dropping the handle does
/// not unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "dropping a Subscription keeps the callback registered; call unsubscribe() to stop it"]
pub struct Subscription<S> {
    id: u64,
    subscribers: Weak<Mutex<Subscribers<S>>>,
}

impl<S> Subscription<S> {
    /// Stop future notifications for this observer
    ///
    /// Takes effect for the next callback the store is about to run, even in
    /// the middle of a notification round. A call to this observer already
    /// running on another thread is not interrupted. Returns `false` if the
    /// observer was already gone (store dropped).
    #[allow(clippy::must_use_candidate)]
    pub fn unsubscribe(self) -> bool {
        self.subscribers
            .upgrade()
            .is_some_and(|subscribers| lock(&subscribers).remove(self.id))
    }

    /// Whether the observer is still registered
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscribers
            .upgrade()
            .is_some_and(|subscribers| lock(&subscribers).contains(self.id))
    }
}

impl<S> std::fmt::Debug for Subscription<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{
        Arc, Callback, Effect, EffectHandle, EffectMetrics, EffectTracking, DecrementGuard,
        Instant, Mutex, Reducer, ReducerMetrics, Subscribers, Subscription, lock, watch,
    };

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind a mutex held only while reducing or reading)
    /// 2. Reducer (state transitions)
    /// 3. Environment (injected dependencies)
    /// 4. Subscribers and a watch channel (observation)
    /// 5. Effect execution (with feedback loop)
    ///
    /// Each `send` runs the reducer and notifies every subscriber while holding
    /// a dispatch lock, so no observer ever sees a half-applied transition and
    /// all observers see transitions in the same order. Subscribers receive a
    /// snapshot taken after the reducer ran; the state lock is already released
    /// when they are called.
    ///
    /// Subscriber callbacks run on the dispatching thread. They may read the
    /// store ([`Store::state`], [`Store::watch`], [`Store::subscriber_count`])
    /// and unsubscribe, but must not call [`Store::send`] or
    /// [`Store::subscribe`]; doing so deadlocks.
    ///
    /// Cloning a Store is cheap and yields a handle to the same state.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        inner: Arc<Inner<S, E, R>>,
    }

    struct Inner<S, E, R> {
        dispatch: Mutex<()>,
        state: Mutex<S>,
        reducer: R,
        environment: E,
        subscribers: Arc<Mutex<Subscribers<S>>>,
        watch: watch::Sender<S>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            super::metrics::register_metrics();
            let (watch, _) = watch::channel(initial_state.clone());

            Self {
                inner: Arc::new(Inner {
                    dispatch: Mutex::new(()),
                    state: Mutex::new(initial_state),
                    reducer,
                    environment,
                    subscribers: Arc::new(Mutex::new(Subscribers::new())),
                    watch,
                }),
            }
        }

        /// Send an action through the reducer
        ///
        /// The transition and all subscriber notifications complete before this
        /// returns. Actions the reducer does not [`apply`](Reducer::applies)
        /// leave the state untouched and notify nobody.
        ///
        /// Effects returned by the reducer are spawned on the current tokio
        /// runtime; use the returned handle to wait for them. Effects are
        /// dropped with a warning when no runtime is available.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub fn send(&self, action: A) -> EffectHandle {
            let dispatch = lock(&self.inner.dispatch);
            let started = Instant::now();

            let (effects, snapshot) = {
                let mut state = lock(&self.inner.state);
                if !self.inner.reducer.applies(&*state, &action) {
                    tracing::debug!("Action does not apply to current state, skipping");
                    return EffectHandle::completed();
                }

                let effects = self
                    .inner
                    .reducer
                    .reduce(&mut *state, action, &self.inner.environment);
                (effects, (*state).clone())
            };
            ReducerMetrics::record_action(started.elapsed());

            self.notify(&snapshot);
            drop(dispatch);

            let (handle, tracking) = EffectHandle::new();
            for effect in effects {
                self.execute_effect(effect, &tracking);
            }
            handle
        }

        /// Register an observer
        ///
        /// The callback is invoked immediately with the current state, then
        /// synchronously on every transition, after observers registered
        /// earlier.
        pub fn subscribe<F>(&self, callback: F) -> Subscription<S>
        where
            F: Fn(&S) + Send + Sync + 'static,
        {
            let callback: Callback<S> = Arc::new(callback);

            // Holding the dispatch lock keeps a transition from slipping in
            // between the replay and the registration.
            let dispatch = lock(&self.inner.dispatch);
            let current = (*lock(&self.inner.state)).clone();
            let id = lock(&self.inner.subscribers).insert(Arc::clone(&callback));
            callback(&current);
            drop(dispatch);

            tracing::debug!(subscriber = id, "Subscriber registered");
            Subscription {
                id,
                subscribers: Arc::downgrade(&self.inner.subscribers),
            }
        }

        /// Number of registered observers
        #[must_use]
        pub fn subscriber_count(&self) -> usize {
            lock(&self.inner.subscribers).entries.len()
        }

        /// Receiver that always holds the latest state
        ///
        /// For async consumers; the current state is available immediately via
        /// `borrow()`.
        #[must_use]
        pub fn watch(&self) -> watch::Receiver<S> {
            self.inner.watch.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let loading = store.state(|s| s.is_loading);
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = lock(&self.inner.state);
            f(&*state)
        }

        /// The injected environment
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.inner.environment
        }

        /// Must be called with the dispatch lock held and the state lock released
        fn notify(&self, state: &S) {
            let callbacks = lock(&self.inner.subscribers).snapshot();
            for (id, callback) in callbacks {
                // Skip observers unsubscribed earlier in this round
                if !lock(&self.inner.subscribers).contains(id) {
                    continue;
                }
                callback(state);
            }
            self.inner.watch.send_replace(state.clone());
        }

        /// Execute an effect with tracking
        ///
        /// `Future` effects are spawned; an action they produce is sent back
        /// into the store and its own effects are awaited before the tracking
        /// counter is released.
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    EffectMetrics::record_execution("none");
                },
                Effect::Future(fut) => {
                    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                        tracing::warn!("No tokio runtime available, dropping Effect::Future");
                        EffectMetrics::record_dropped();
                        return;
                    };

                    tracing::trace!("Executing Effect::Future");
                    EffectMetrics::record_execution("future");
                    tracking.increment();

                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    runtime.spawn(async move {
                        let _guard = guard;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            store.send(action).wait().await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    });
                },
            }
        }
    }
}

pub use store::Store;
