use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the remote text-generation service.
#[derive(Debug, Error)]
pub enum DisambiguationError {
    #[error("request to disambiguation service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("disambiguation service returned an unexpected response: {0}")]
    MalformedResponse(String),
}

/// Missing or unusable process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("setting {key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("cannot read layout profile {path}: {reason}")]
    Profile { path: PathBuf, reason: String },
}

/// Everything that can abort the processing of one document.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fragment {index} ({fragment:?}) appears before any category heading")]
    NoOpenCategory { index: usize, fragment: String },
    #[error("category {label:?} not found in grouped menu")]
    MissingCategory { label: String },
    #[error("category {label:?} has {len} fragments, expected name/description pairs")]
    OddRowPairs { label: String, len: usize },
    #[error("compound heading {label:?} does not split into two names on {separator:?}")]
    MalformedCompoundLabel { label: String, separator: String },
    #[error("compound heading {label:?} has {len} fragments, fewer than its {tail} shared trailing lines")]
    CompoundTooShort { label: String, len: usize, tail: usize },
    #[error("category {label:?} is rewritten by more than one resolver")]
    PatchConflict { label: String },
    #[error("invalid category pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error(transparent)]
    Disambiguation(#[from] DisambiguationError),
    #[error("cannot extract text from {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PipelineError {
    /// True for layout violations: the document does not have the shape the
    /// layout profile describes.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PipelineError::NoOpenCategory { .. }
                | PipelineError::MissingCategory { .. }
                | PipelineError::OddRowPairs { .. }
                | PipelineError::MalformedCompoundLabel { .. }
                | PipelineError::CompoundTooShort { .. }
                | PipelineError::PatchConflict { .. }
                | PipelineError::InvalidPattern(_)
        )
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
