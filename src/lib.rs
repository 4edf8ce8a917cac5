//! credit-default: a credit-card default classifier.
//!
//! The crate cleans the UCI "default of credit card clients" tables, fits a
//! preprocessing + univariate selection + PCA + MLP pipeline with a
//! cross-validated grid search, persists the fitted model and writes train and
//! test metrics as JSON lines.
//!
//! Every stage is implemented on top of `ndarray` and follows the fit /
//! transform conventions familiar from scikit-learn.
pub mod cleaning;
pub mod config;
pub mod data_handling;
pub mod decomposition;
pub mod error;
pub mod feature_selection;
pub mod inference;
pub mod io;
pub mod math;
pub mod metrics;
pub mod model_selection;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod training;
