//! Reading input tables and persisting fitted models.

pub mod csv_zip;
pub mod model_store;

pub use csv_zip::{read_csv, read_csv_zip, read_table};
pub use model_store::{load_model, save_model, ModelArtifact};
