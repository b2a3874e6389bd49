pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod predict;
pub mod preprocessing;
pub mod stats;

pub use config::PreprocessConfig;
pub use dataset::{
    AugmentedLoader, BatchPreprocessor, Manifest, ProcessedBatch, SplitDataset, process_in_batches,
    process_manifest, stratified_split,
};
pub use error::{PrepError, Result};
pub use models::{Label, ManifestRow, SENTINEL_LABEL, TargetSize, Verdict};
pub use pipeline::Preprocessor;
pub use predict::{Classifier, LinearClassifier, Prediction, predict_single_image};
pub use preprocessing::{ContrastMode, preprocess_image};
