use ndarray::{Array1, Array4, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::validate_fraction;
use crate::error::{PrepError, Result};

/// Train/validation partition of one source batch.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    pub train_images: Array4<f32>,
    pub train_labels: Array1<u8>,
    pub validation_images: Array4<f32>,
    pub validation_labels: Array1<u8>,
    /// Source rows of each partition, ascending.
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
}

/// Stratified split with roughly `fraction` of each class in validation.
///
/// Each class with at least two members contributes
/// `round(count * fraction)` rows to validation, clamped so both sides
/// keep at least one. A class with a single member cannot be stratified
/// and goes to training in full.
pub fn stratified_split(
    images: &Array4<f32>,
    labels: &Array1<u8>,
    fraction: f64,
    seed: u64,
) -> Result<SplitDataset> {
    validate_fraction(fraction)?;
    if labels.is_empty() {
        return Err(PrepError::invalid("cannot split an empty batch"));
    }
    if images.len_of(Axis(0)) != labels.len() {
        return Err(PrepError::invalid(format!(
            "image count {} does not match label count {}",
            images.len_of(Axis(0)),
            labels.len()
        )));
    }

    let mut classes: Vec<u8> = labels.iter().copied().collect();
    classes.sort_unstable();
    classes.dedup();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut validation_indices = Vec::new();

    for class in classes {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();

        if members.len() < 2 {
            tracing::warn!(class, count = members.len(), "class too small to stratify");
            train_indices.extend(members);
            continue;
        }

        members.shuffle(&mut rng);
        let take = ((members.len() as f64 * fraction).round() as usize).clamp(1, members.len() - 1);
        let (validation, train) = members.split_at(take);
        validation_indices.extend_from_slice(validation);
        train_indices.extend_from_slice(train);
    }

    train_indices.sort_unstable();
    validation_indices.sort_unstable();

    Ok(SplitDataset {
        train_images: images.select(Axis(0), &train_indices),
        train_labels: labels.select(Axis(0), &train_indices),
        validation_images: images.select(Axis(0), &validation_indices),
        validation_labels: labels.select(Axis(0), &validation_indices),
        train_indices,
        validation_indices,
    })
}
