//! # Dymis Testing
//!
//! Testing utilities and helpers for Dymis.
//!
//! This crate provides:
//! - A scripted [`AnalysisExecutor`](dymis_core::AnalysisExecutor) that never touches the network
//! - Fixtures for analysis results
//! - A Given-When-Then harness for reducers
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use dymis_testing::{MockExecutor, fixtures};
//! use dymis_lifecycle::LifecycleStore;
//!
//! #[tokio::test]
//! async fn test_submit() {
//!     let executor = MockExecutor::new().respond_ok(fixtures::analysis_result("hello"));
//!     let store = LifecycleStore::new(executor);
//!
//!     let state = store.analyze("hello").await;
//!     assert!(state.results().is_some());
//! }
//! ```


/// Mock implementations of environment traits
pub mod mocks {
    use dymis_core::{AnalysisError, AnalysisExecutor, AnalysisRequest, AnalysisResult};
    use futures::future::BoxFuture;
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use std::time::Duration;

    /// Message returned once the scripted responses run out
    pub const EXHAUSTED_MESSAGE: &str = "MockExecutor has no scripted response left";

    struct Scripted {
        delay: Option<Duration>,
        outcome: Result<AnalysisResult, AnalysisError>,
    }

    /// Executor that replays scripted outcomes in order
    ///
    /// Blank content is rejected exactly like the real client and is not
    /// recorded as a call, so [`call_count`](Self::call_count) counts only
    /// requests that would have reached the network.
    ///
    /// # Example
    ///
    /// ```
    /// use dymis_core::{AnalysisExecutor, ErrorKind};
    /// use dymis_testing::{MockExecutor, fixtures};
    ///
    /// # tokio_test::block_on(async {
    /// let executor = MockExecutor::new()
    ///     .respond_ok(fixtures::analysis_result("hello"))
    ///     .respond_server_error(503, "overloaded");
    ///
    /// assert!(executor.execute("hello").await.is_ok());
    /// let err = executor.execute("hello").await.unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::Server);
    ///
    /// let err = executor.execute("  ").await.unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::Validation);
    /// assert_eq!(executor.call_count(), 2);
    /// # });
    /// ```
    #[derive(Default)]
    pub struct MockExecutor {
        script: Mutex<VecDeque<Scripted>>,
        calls: Mutex<Vec<String>>,
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    impl MockExecutor {
        /// Create an executor with an empty script
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue an outcome
        #[must_use]
        pub fn respond(self, outcome: Result<AnalysisResult, AnalysisError>) -> Self {
            lock(&self.script).push_back(Scripted {
                delay: None,
                outcome,
            });
            self
        }

        /// Queue an outcome delivered after `delay`
        #[must_use]
        pub fn respond_after(
            self,
            delay: Duration,
            outcome: Result<AnalysisResult, AnalysisError>,
        ) -> Self {
            lock(&self.script).push_back(Scripted {
                delay: Some(delay),
                outcome,
            });
            self
        }

        /// Queue a successful result
        #[must_use]
        pub fn respond_ok(self, result: AnalysisResult) -> Self {
            self.respond(Ok(result))
        }

        /// Queue a server error
        #[must_use]
        pub fn respond_server_error(self, status: u16, message: impl Into<String>) -> Self {
            self.respond(Err(AnalysisError::server(status, message)))
        }

        /// Contents of every call that passed validation, in call order
        #[must_use]
        pub fn calls(&self) -> Vec<String> {
            lock(&self.calls).clone()
        }

        /// Number of calls that passed validation
        #[must_use]
        pub fn call_count(&self) -> usize {
            lock(&self.calls).len()
        }
    }

    impl AnalysisExecutor for MockExecutor {
        fn execute<'a>(
            &'a self,
            content: &'a str,
        ) -> BoxFuture<'a, Result<AnalysisResult, AnalysisError>> {
            Box::pin(async move {
                let request = AnalysisRequest::new(content)?;
                lock(&self.calls).push(request.content);

                let next = lock(&self.script).pop_front();
                let Some(scripted) = next else {
                    return Err(AnalysisError::transport(EXHAUSTED_MESSAGE));
                };

                if let Some(delay) = scripted.delay {
                    tokio::time::sleep(delay).await;
                }
                scripted.outcome
            })
        }
    }
}

/// Test data builders
pub mod fixtures {
    use dymis_core::{AnalysisResult, EducationalBreakdown};

    /// A result echoing `content`, with two breakdown items
    #[must_use]
    pub fn analysis_result(content: &str) -> AnalysisResult {
        AnalysisResult {
            trust_score: 72.0,
            result_summary: "Mostly reliable, with some emotive framing.".to_string(),
            original_content: content.to_string(),
            educational_breakdown: vec![
                breakdown("Loaded language", "Emotive wording used to persuade", "shocking"),
                breakdown("Unnamed source", "Claim attributed to unnamed experts", "experts say"),
            ],
        }
    }

    /// A single breakdown item
    #[must_use]
    pub fn breakdown(title: &str, explanation: &str, quote: &str) -> EducationalBreakdown {
        EducationalBreakdown {
            title: title.to_string(),
            explanation: explanation.to_string(),
            quote: quote.to_string(),
        }
    }
}

/// Tracing setup for tests
pub mod tracing_setup {
    /// Install a test-writer subscriber honoring `RUST_LOG`
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::MockExecutor;
pub use reducer_test::{ReducerTest, assertions};
pub use tracing_setup::init_test_tracing;

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;
    use dymis_core::{AnalysisExecutor, ErrorKind};

    #[tokio::test]
    async fn test_mock_executor_replays_in_order() {
        let executor = MockExecutor::new()
            .respond_ok(fixtures::analysis_result("a"))
            .respond_server_error(500, "boom");

        let first = executor.execute("a").await.unwrap();
        assert_eq!(first.original_content, "a");

        let second = executor.execute("b").await.unwrap_err();
        assert_eq!(second.message(), "boom");

        let third = executor.execute("c").await.unwrap_err();
        assert_eq!(third.kind(), ErrorKind::Transport);
        assert_eq!(third.message(), mocks::EXHAUSTED_MESSAGE);

        assert_eq!(executor.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_mock_executor_validates_before_recording() {
        let executor = MockExecutor::new().respond_ok(fixtures::analysis_result("x"));
        let err = executor.execute("\t").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(executor.call_count(), 0);
    }

    #[test]
    fn test_init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
    }
}
