//! Linear dimensionality reduction.
pub mod pca;

pub use pca::Pca;
