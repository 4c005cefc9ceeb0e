//! # Dymis Lifecycle
//!
//! Tracks one analysis request from submission to result for a
//! presentation layer.
//!
//! The rendered state is always exactly one of:
//!
//! - **Idle**: nothing in flight, nothing to show
//! - **Loading**: a request is in flight
//! - **Succeeded**: results are available
//! - **Failed**: an error message is available
//!
//! ## Example
//!
//! ```no_run
//! use dymis_client::AnalysisClient;
//! use dymis_lifecycle::LifecycleStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = LifecycleStore::new(AnalysisClient::from_env()?);
//!
//! let _subscription = store.subscribe(|state| {
//!     if state.is_loading() {
//!         println!("Analyzing...");
//!     } else if let Some(error) = state.error() {
//!         println!("Error: {error}");
//!     } else if let Some(results) = state.results() {
//!         println!("Trust score: {}", results.trust_score);
//!     }
//! });
//!
//! store.analyze("Scientists confirm chocolate cures everything.").await;
//! # Ok(())
//! # }
//! ```

pub mod reducer;
pub mod state;
pub mod store;

pub use reducer::{LifecycleAction, LifecycleEnvironment, LifecycleReducer};
pub use state::{AnalysisState, LifecycleState, Phase};
pub use store::{LifecycleStore, LifecycleSubscription, NO_RUNTIME_MESSAGE};
