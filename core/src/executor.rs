//! The seam through which an analysis request is performed
//!
//! The HTTP client implements this trait in production; tests inject
//! scripted implementations through the reducer environment.

use crate::{analysis::AnalysisResult, error::AnalysisError};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Performs one analysis round trip
///
/// Implementations make exactly one attempt per call and surface exactly one
/// error on failure.
pub trait AnalysisExecutor: Send + Sync {
    /// Analyze `content`
    ///
    /// # Errors
    ///
    /// Returns an [`AnalysisError`] of one of the four kinds in
    /// [`ErrorKind`](crate::ErrorKind).
    fn execute<'a>(&'a self, content: &'a str) -> BoxFuture<'a, Result<AnalysisResult, AnalysisError>>;
}

impl<T: AnalysisExecutor + ?Sized> AnalysisExecutor for Arc<T> {
    fn execute<'a>(&'a self, content: &'a str) -> BoxFuture<'a, Result<AnalysisResult, AnalysisError>> {
        (**self).execute(content)
    }
}
