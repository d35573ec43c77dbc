use kgprep_core::error::{ErrorCode, KgprepError};
use kgprep_core::model::Split;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("shape mismatch: edge index holds {edges} edges but edge type vector holds {types}")]
    ShapeMismatch { edges: usize, types: usize },
    #[error("edge index must have shape [2, E], got {0:?}")]
    InvalidEdgeIndexShape(Vec<usize>),
    #[error("mask length {mask} does not match {edges} edges")]
    LengthMismatch { mask: usize, edges: usize },
    #[error("record {index} exposes {fields} fields, expected head, relation, tail")]
    MalformedRecord { index: usize, fields: usize },
    #[error("edge {position} is in both the {first} and {second} masks")]
    OverlappingMasks {
        first: Split,
        second: Split,
        position: usize,
    },
}

impl KgprepError for ExtractionError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::InvalidArgument
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("dataset {dataset} unavailable: {reason}")]
    DatasetUnavailable { dataset: String, reason: String },
}

impl SourceError {
    pub fn unavailable(dataset: &str, reason: impl ToString) -> Self {
        SourceError::DatasetUnavailable {
            dataset: dataset.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl KgprepError for SourceError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SourceError::DatasetUnavailable { .. } => ErrorCode::Unavailable,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("dataset {dataset}: {source}")]
    Dataset {
        dataset: String,
        #[source]
        source: ExtractionError,
    },
    #[error("dataset {dataset} split {split}: {source}")]
    Split {
        dataset: String,
        split: Split,
        #[source]
        source: ExtractionError,
    },
}

impl PipelineError {
    pub(crate) fn dataset(dataset: &str, source: ExtractionError) -> Self {
        PipelineError::Dataset {
            dataset: dataset.to_string(),
            source,
        }
    }

    pub(crate) fn split(dataset: &str, split: Split, source: ExtractionError) -> Self {
        PipelineError::Split {
            dataset: dataset.to_string(),
            split,
            source,
        }
    }
}

impl KgprepError for PipelineError {
    fn error_code(&self) -> ErrorCode {
        match self {
            PipelineError::Source(err) => err.error_code(),
            PipelineError::Dataset { source, .. } | PipelineError::Split { source, .. } => {
                source.error_code()
            }
        }
    }
}
