use thiserror::Error;

/// Custom error type for the GraphGrad engine.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum GraphGradError {
    #[error("shape mismatch: {left:?} vs {right:?} during operation {operation}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
        operation: String,
    },

    #[error("matrix creation error: expected {expected} values, got {actual}")]
    CreationError { expected: usize, actual: usize },

    #[error("rank-deficient system: no usable pivot in column {column}")]
    RankDeficiency { column: usize },

    #[error("unsupported optimizer: {name}")]
    UnsupportedOptimizer { name: String },
}
