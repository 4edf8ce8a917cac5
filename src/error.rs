use std::error::Error;
use std::fmt;

/// Error type for fitting and applying pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A stage was used for transform/predict before `fit`.
    NotFitted(&'static str),
    /// Input matrix width does not match what the stage was fitted on.
    ShapeMismatch { expected: usize, found: usize },
    /// A hyper-parameter is outside of its valid range.
    InvalidParameter(String),
    /// Training labels contain a single class.
    SingleClass,
    EmptyInput,
    /// Paired arrays (labels, predictions) differ in length.
    LengthMismatch { left: usize, right: usize },
    /// Every grid-search candidate failed on every fold.
    AllCandidatesFailed,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::NotFitted(stage) => write!(f, "{} has not been fitted", stage),
            PipelineError::ShapeMismatch { expected, found } => write!(
                f,
                "expected {} feature columns, found {}",
                expected, found
            ),
            PipelineError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            PipelineError::SingleClass => {
                write!(f, "training labels must contain both classes 0 and 1")
            }
            PipelineError::EmptyInput => write!(f, "input has no rows"),
            PipelineError::LengthMismatch { left, right } => write!(
                f,
                "arrays must have equal lengths ({} != {})",
                left, right
            ),
            PipelineError::AllCandidatesFailed => {
                write!(f, "every grid-search candidate failed to fit")
            }
        }
    }
}

impl Error for PipelineError {}

pub type Result<T> = std::result::Result<T, PipelineError>;
