//! Cross-validated model selection.
//!
//! `StratifiedKFold` builds class-preserving folds and `GridSearchCv`
//! scores every parameter combination on them before refitting the winner.
pub mod grid_search;
pub mod kfold;

pub use grid_search::{CandidateResult, GridSearchCv};
pub use kfold::StratifiedKFold;
