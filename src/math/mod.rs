//! Small dense linear-algebra and activation helpers on top of `ndarray`.
//!
//! Only what the pipeline stages need: a symmetric eigendecomposition for
//! PCA and the activation/loss functions used by the perceptron.
pub mod activation;
pub mod eigen;

pub use eigen::symmetric_eigen;
