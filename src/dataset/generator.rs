//! Lazy, restartable stream of augmented training batches.
//!
//! Each epoch owns its own RNG seeded from the loader seed and the epoch
//! number. Iterating an epoch again reproduces the same order and the same
//! transforms.

use ndarray::{Array1, Array3, Array4, Axis, stack};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::validate_batch_size;
use crate::error::Result;
use crate::models::ManifestRow;
use crate::pipeline::Preprocessor;

/// One batch drawn from the loader.
#[derive(Debug, Clone)]
pub struct Batch {
    pub images: Array4<f32>,
    pub labels: Array1<u8>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub struct AugmentedLoader<'a> {
    rows: &'a [ManifestRow],
    preprocessor: &'a Preprocessor,
    batch_size: usize,
    seed: u64,
    shuffle: bool,
}

impl<'a> AugmentedLoader<'a> {
    pub fn new(
        rows: &'a [ManifestRow],
        preprocessor: &'a Preprocessor,
        batch_size: usize,
        seed: u64,
    ) -> Result<Self> {
        validate_batch_size(batch_size)?;
        preprocessor.validate()?;
        Ok(Self {
            rows,
            preprocessor,
            batch_size,
            seed,
            shuffle: true,
        })
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Number of batches per epoch, before failed rows are dropped.
    pub fn batches_per_epoch(&self) -> usize {
        self.rows.len().div_ceil(self.batch_size)
    }

    pub fn epoch(&self, epoch: u64) -> EpochBatches<'_> {
        let mut rng = StdRng::seed_from_u64(self.seed ^ epoch.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        if self.shuffle {
            order.shuffle(&mut rng);
        }
        EpochBatches {
            loader: self,
            order,
            cursor: 0,
            rng,
        }
    }
}

pub struct EpochBatches<'l> {
    loader: &'l AugmentedLoader<'l>,
    order: Vec<usize>,
    cursor: usize,
    rng: StdRng,
}

impl EpochBatches<'_> {
    fn next_batch(&mut self) -> Option<Batch> {
        let end = (self.cursor + self.loader.batch_size).min(self.order.len());
        let indices = &self.order[self.cursor..end];
        self.cursor = end;

        let mut images: Vec<Array3<f32>> = Vec::with_capacity(indices.len());
        let mut labels = Vec::with_capacity(indices.len());
        for &i in indices {
            let row = &self.loader.rows[i];
            match self
                .loader
                .preprocessor
                .process_augmented(&row.path, &mut self.rng)
            {
                Ok(image) => {
                    images.push(image);
                    labels.push(row.label.as_u8());
                }
                Err(err) => {
                    tracing::warn!(path = %row.path.display(), error = %err, "skipping sample");
                }
            }
        }

        if images.is_empty() {
            return None;
        }
        let views: Vec<_> = images.iter().map(|img| img.view()).collect();
        let images = stack(Axis(0), &views).ok()?;
        Some(Batch {
            images,
            labels: Array1::from(labels),
        })
    }
}

impl Iterator for EpochBatches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        while self.cursor < self.order.len() {
            if let Some(batch) = self.next_batch() {
                return Some(batch);
            }
        }
        None
    }
}
