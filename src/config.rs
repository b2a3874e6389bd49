use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::models::TargetSize;
use crate::preprocessing::{Augmentation, ContrastMode, ResizeFilter};

/// Run-wide preprocessing settings. Missing JSON fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub target_size: TargetSize,
    pub contrast: ContrastMode,
    pub filter: ResizeFilter,
    /// Rows decoded per chunk; bounds peak memory, never changes the output.
    pub batch_size: usize,
    /// Decode the rows of each chunk on the rayon pool.
    pub parallel: bool,
    pub validation_fraction: f64,
    pub seed: u64,
    /// Only used by the augmenting loader.
    pub augmentation: Option<Augmentation>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_size: TargetSize::default(),
            contrast: ContrastMode::default(),
            filter: ResizeFilter::default(),
            batch_size: 1000,
            parallel: false,
            validation_fraction: 0.2,
            seed: 42,
            augmentation: None,
        }
    }
}

impl PreprocessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.target_size.validate()?;
        self.contrast.validate()?;
        validate_batch_size(self.batch_size)?;
        validate_fraction(self.validation_fraction)
    }
}

pub(crate) fn validate_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(PrepError::invalid("batch size must be at least 1"));
    }
    Ok(())
}

pub(crate) fn validate_fraction(fraction: f64) -> Result<()> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(PrepError::invalid(format!(
            "validation fraction must lie in (0, 1), got {}",
            fraction
        )));
    }
    Ok(())
}
