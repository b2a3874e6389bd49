use std::path::PathBuf;

use ndarray::{Array1, Array3, Array4, Axis};
use rayon::prelude::*;

use crate::config::validate_batch_size;
use crate::error::{PrepError, Result};
use crate::models::{ManifestRow, SENTINEL_LABEL, TargetSize};
use crate::pipeline::Preprocessor;
use crate::preprocessing::ContrastMode;

/// A row that was excluded from the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSample {
    /// Position in the input manifest.
    pub index: usize,
    pub path: PathBuf,
    pub reason: String,
}

/// Result of [`process_in_batches`].
///
/// `images` has shape `(M, height, width, 3)` and `labels` has length `M`,
/// index-aligned and in manifest order.
#[derive(Debug, Clone)]
pub struct ProcessedBatch {
    pub images: Array4<f32>,
    pub labels: Array1<u8>,
    pub failures: Vec<FailedSample>,
}

impl ProcessedBatch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Outcome of preprocessing a single manifest row.
#[derive(Debug)]
pub enum RowOutcome {
    Loaded(Array3<f32>),
    Failed(PrepError),
}

impl From<Result<Array3<f32>>> for RowOutcome {
    fn from(result: Result<Array3<f32>>) -> Self {
        match result {
            Ok(image) => Self::Loaded(image),
            Err(err) => Self::Failed(err),
        }
    }
}

/// Chunked, failure-tolerant batch preprocessing.
#[derive(Debug, Clone)]
pub struct BatchPreprocessor {
    preprocessor: Preprocessor,
    batch_size: usize,
    parallel: bool,
}

impl BatchPreprocessor {
    pub fn new(preprocessor: Preprocessor, batch_size: usize) -> Self {
        Self {
            preprocessor,
            batch_size,
            parallel: false,
        }
    }

    /// Decode the rows of each chunk concurrently. Output is unchanged.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn run(&self, manifest: &[ManifestRow]) -> Result<ProcessedBatch> {
        validate_batch_size(self.batch_size)?;
        self.preprocessor.validate()?;

        let (height, width, channels) = self.preprocessor.target_size().image_shape();
        let num_samples = manifest.len();
        let mut images = Array4::<f32>::zeros((num_samples, height, width, channels));
        let mut slots = Array1::<i8>::zeros(num_samples);
        let mut failures = Vec::new();

        for (chunk_idx, chunk) in manifest.chunks(self.batch_size).enumerate() {
            let start = chunk_idx * self.batch_size;
            tracing::debug!(
                chunk = chunk_idx,
                start,
                end = start + chunk.len(),
                "processing chunk"
            );

            let outcomes = self.process_chunk(chunk);

            for (offset, (row, outcome)) in chunk.iter().zip(outcomes).enumerate() {
                let index = start + offset;
                match outcome {
                    RowOutcome::Loaded(image) => {
                        images.index_axis_mut(Axis(0), index).assign(&image);
                        slots[index] = row.label.as_u8() as i8;
                    }
                    RowOutcome::Failed(err) => {
                        tracing::warn!(path = %row.path.display(), error = %err, "skipping sample");
                        images.index_axis_mut(Axis(0), index).fill(0.0);
                        slots[index] = SENTINEL_LABEL;
                        failures.push(FailedSample {
                            index,
                            path: row.path.clone(),
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }

        let batch = drop_failed(images, slots, failures);
        tracing::info!(
            requested = num_samples,
            kept = batch.len(),
            failed = batch.failures.len(),
            "batch preprocessing finished"
        );
        Ok(batch)
    }

    fn process_chunk(&self, chunk: &[ManifestRow]) -> Vec<RowOutcome> {
        let load = |row: &ManifestRow| RowOutcome::from(self.preprocessor.process_path(&row.path));
        if self.parallel {
            chunk.par_iter().map(load).collect()
        } else {
            chunk.iter().map(load).collect()
        }
    }
}

/// Remove sentinel-labeled slots, keeping the relative order of the rest.
fn drop_failed(images: Array4<f32>, slots: Array1<i8>, failures: Vec<FailedSample>) -> ProcessedBatch {
    if failures.is_empty() {
        return ProcessedBatch {
            images,
            labels: slots.mapv(|l| l as u8),
            failures,
        };
    }

    let keep: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|&(_, &label)| label != SENTINEL_LABEL)
        .map(|(i, _)| i)
        .collect();

    ProcessedBatch {
        images: images.select(Axis(0), &keep),
        labels: keep.iter().map(|&i| slots[i] as u8).collect(),
        failures,
    }
}

/// Preprocess every manifest row into one tensor batch.
///
/// Unreadable rows are logged, reported in [`ProcessedBatch::failures`] and
/// left out; they never abort the batch. Fails only on invalid parameters.
pub fn process_in_batches(
    manifest: &[ManifestRow],
    batch_size: usize,
    target_size: TargetSize,
    stretch_contrast: bool,
) -> Result<ProcessedBatch> {
    let preprocessor = Preprocessor::new()
        .with_target_size(target_size)
        .with_contrast(ContrastMode::from_stretch_flag(stretch_contrast));
    BatchPreprocessor::new(preprocessor, batch_size).run(manifest)
}

/// [`process_in_batches`] with a fully configured [`Preprocessor`].
pub fn process_manifest(
    manifest: &[ManifestRow],
    batch_size: usize,
    preprocessor: &Preprocessor,
) -> Result<ProcessedBatch> {
    BatchPreprocessor::new(preprocessor.clone(), batch_size).run(manifest)
}
