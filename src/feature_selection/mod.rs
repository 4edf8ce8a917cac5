//! Feature selection utilities.
//!
//! This module contains univariate selection routines (a la scikit-learn)
//! for scoring and ranking features with the ANOVA F-test.
pub mod univariate_selection;

pub use univariate_selection::{f_classif, SelectKBest};
