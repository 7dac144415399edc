//! Transcript provenance

use serde::{Deserialize, Serialize};

/// Where in a transcript a claim was found
///
/// Opaque to verification: it is copied verbatim from the claim into the
/// verdict. The document id doubles as the transcript key for cross-claim
/// conflict checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptProvenance {
    /// Transcript document identifier
    pub document_id: String,

    /// Character offset where the quoted span starts
    #[serde(default)]
    pub span_start: usize,

    /// Character offset where the quoted span ends (exclusive)
    #[serde(default)]
    pub span_end: usize,
}

impl TranscriptProvenance {
    /// Create a provenance record for a span of a transcript
    pub fn new(document_id: impl Into<String>, span_start: usize, span_end: usize) -> Self {
        Self {
            document_id: document_id.into(),
            span_start,
            span_end,
        }
    }

    /// Length of the quoted span in characters
    pub fn span_len(&self) -> usize {
        self.span_end.saturating_sub(self.span_start)
    }
}
