use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

const MAX_INTENSITY: f32 = 255.0;

/// How pixel intensities are mapped into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ContrastMode {
    /// Divide by 255 only.
    None,
    /// Divide by 255, then by the image maximum so the brightest value is 1.0.
    #[default]
    MaxStretch,
    /// Clip-stretch between two percentiles of the raw values.
    Percentile { low: f32, high: f32 },
}

impl ContrastMode {
    pub fn from_stretch_flag(stretch: bool) -> Self {
        if stretch { Self::MaxStretch } else { Self::None }
    }

    /// 2nd/98th percentile clip-stretch.
    pub fn percentile() -> Self {
        Self::Percentile {
            low: 2.0,
            high: 98.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Self::Percentile { low, high } = *self {
            if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
                return Err(PrepError::invalid(format!(
                    "percentile bounds must satisfy 0 <= low < high <= 100, got {}..{}",
                    low, high
                )));
            }
        }
        Ok(())
    }
}

/// Maps raw `[0, 255]` pixel arrays to `f32` arrays in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContrastNormalizer {
    pub mode: ContrastMode,
}

impl ContrastNormalizer {
    pub fn new(mode: ContrastMode) -> Self {
        Self { mode }
    }

    pub fn normalize<A>(&self, image: ArrayView3<'_, A>) -> Array3<f32>
    where
        A: Copy + Into<f32>,
    {
        match self.mode {
            ContrastMode::None => baseline(image),
            ContrastMode::MaxStretch => max_stretch(image),
            ContrastMode::Percentile { low, high } => percentile_stretch(image, low, high),
        }
    }
}

fn baseline<A: Copy + Into<f32>>(image: ArrayView3<'_, A>) -> Array3<f32> {
    image.mapv(|v| v.into() / MAX_INTENSITY)
}

fn max_stretch<A: Copy + Into<f32>>(image: ArrayView3<'_, A>) -> Array3<f32> {
    let mut scaled = baseline(image);
    let current_max = scaled.fold(0.0f32, |acc, &v| acc.max(v));
    // All-black image: nothing to stretch.
    if current_max > 0.0 {
        scaled.mapv_inplace(|v| v / current_max);
    }
    scaled
}

fn percentile_stretch<A: Copy + Into<f32>>(
    image: ArrayView3<'_, A>,
    low: f32,
    high: f32,
) -> Array3<f32> {
    let mut sorted: Vec<f32> = image.iter().map(|&v| v.into()).collect();
    if sorted.is_empty() {
        return Array3::zeros(image.raw_dim());
    }
    sorted.sort_unstable_by(f32::total_cmp);

    let p_low = percentile_of_sorted(&sorted, low);
    let p_high = percentile_of_sorted(&sorted, high);
    if p_high <= p_low {
        return baseline(image);
    }

    let range = p_high - p_low;
    image.mapv(|v| ((v.into() - p_low) / range).clamp(0.0, 1.0))
}

/// Linear interpolation between closest ranks. `q` is clamped to `[0, 100]`.
fn percentile_of_sorted(sorted: &[f32], q: f32) -> f32 {
    let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 100.0) };
    let rank = (q / 100.0) * (sorted.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(sorted.len() - 1);
    let frac = rank - lower as f32;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
