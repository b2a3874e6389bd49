pub mod batch;
pub mod generator;
pub mod manifest;
pub mod split;

pub use batch::{
    BatchPreprocessor, FailedSample, ProcessedBatch, RowOutcome, process_in_batches, process_manifest,
};
pub use generator::{AugmentedLoader, Batch, EpochBatches};
pub use manifest::{ClassCounts, DirSummary, Manifest, scan_directory};
pub use split::{SplitDataset, stratified_split};
