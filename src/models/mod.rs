pub mod classifier_trait;
pub mod mlp;

pub use classifier_trait::ClassifierModel;
pub use mlp::MlpClassifier;
