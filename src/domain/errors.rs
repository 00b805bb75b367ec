//! Typed failure unions for each pipeline component.
//!
//! Every component surfaces a closed enum to its immediate caller; the
//! orchestrator translates the first failure into a [`PipelineError`]
//! annotated with the stage that produced it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content extraction failures.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("no product fields found at {url}")]
    NoProductData { url: String },

    #[error("page refused the request with status {status}")]
    Blocked { status: u16 },

    #[error("page fetch timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("page fetch failed: {message}")]
    Fetch { message: String },

    #[error("page fetch cancelled by the caller")]
    Cancelled,
}

impl ExtractionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoProductData { .. } | Self::Fetch { .. } | Self::Cancelled => {
                ErrorKind::ExtractionFailed
            }
            Self::Blocked { .. } => ErrorKind::PageBlocked,
            Self::Timeout { .. } => ErrorKind::ExtractionTimeout,
        }
    }
}

/// Analysis engine failures.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("analysis returned no usable content: {reason}")]
    Unavailable { reason: String },

    #[error("analysis timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("analysis call cancelled by the caller")]
    Cancelled,
}

impl AnalysisError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable { .. } | Self::Cancelled => ErrorKind::AnalysisUnavailable,
            Self::Timeout { .. } => ErrorKind::AnalysisTimeout,
        }
    }
}

/// Saved-product store failures.
///
/// `NotOwner` renders with the same message as `NotFound`: a requester must
/// not learn whether a record they do not own exists. The variants stay
/// distinct so the store can audit refused deletes internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("saved product not found: {id}")]
    NotFound { id: String },

    #[error("saved product not found: {id}")]
    NotOwner { id: String },

    #[error("persistence failed: {message}")]
    Persistence { message: String },
}

impl StoreError {
    pub(crate) fn persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotOwner { .. } => ErrorKind::NotOwner,
            Self::Persistence { .. } => ErrorKind::PersistenceFailed,
        }
    }
}

/// Boundary-facing failure classification.
///
/// The request boundary maps these to status codes and user-facing copy;
/// this crate never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidUrl,
    ExtractionFailed,
    PageBlocked,
    ExtractionTimeout,
    AnalysisUnavailable,
    AnalysisTimeout,
    NotFound,
    NotOwner,
    PersistenceFailed,
}

/// Pipeline stages in execution order. A stage never begins before its
/// predecessor succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Validating,
    Extracting,
    Analyzing,
    Composing,
    Done,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Extracting => "extracting",
            Self::Analyzing => "analyzing",
            Self::Composing => "composing",
            Self::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Terminal failure of a pipeline invocation: the first failing stage, its
/// classification, and a human-readable message.
#[derive(Debug, Clone, Error)]
#[error("pipeline failed while {stage}: {message}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub kind: ErrorKind,
    pub message: String,
}

impl PipelineError {
    #[must_use]
    pub fn new(stage: PipelineStage, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }
}
