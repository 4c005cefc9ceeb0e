//! Data model for the analysis endpoint

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/analyze`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Text (or URL) to analyze
    pub content: String,
}

impl AnalysisRequest {
    /// Build a request, rejecting blank content
    ///
    /// The content is sent as given; trimming is only used for the emptiness check.
    ///
    /// # Errors
    ///
    /// Returns a validation error ("Content cannot be empty") when `content`
    /// is empty or whitespace only.
    pub fn new(content: impl Into<String>) -> Result<Self, AnalysisError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(AnalysisError::empty_content());
        }
        Ok(Self { content })
    }
}

/// One rationale item attached to an analysis
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EducationalBreakdown {
    /// Title of the issue found
    pub title: String,
    /// Why the issue is problematic
    pub explanation: String,
    /// Quote from the content exemplifying the issue
    pub quote: String,
}

/// Result returned by a successful analysis
///
/// Only the object shape of the body is checked; absent fields fall back to
/// their defaults and unknown fields are ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisResult {
    /// Trust score reported by the service (0-100 by convention)
    pub trust_score: f64,
    /// Short summary of the verdict
    pub result_summary: String,
    /// The content the service analyzed
    pub original_content: String,
    /// Rationale items, in display order
    pub educational_breakdown: Vec<EducationalBreakdown>,
}
