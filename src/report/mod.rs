//! Evaluation records and their newline-delimited JSON output.
//!
//! Each split produces a point-metrics record and a confusion-matrix record;
//! `write_metrics` serializes them one JSON object per line.
pub mod records;

pub use records::{
    evaluate_split, write_metrics, ClassificationMetrics, ConfusionMatrixRecord, MetricsRecord,
    PredictedCounts, Split,
};
