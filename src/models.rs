use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Label slot value marking a row whose image could not be loaded.
/// Never survives past [`crate::dataset::process_in_batches`].
pub const SENTINEL_LABEL: i8 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Label {
    Fake = 0,
    Real = 1,
}

impl Label {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Fake),
            1 => Some(Self::Real),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fake => write!(f, "Fake"),
            Self::Real => write!(f, "Real"),
        }
    }
}

impl FromStr for Label {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "fake" => Ok(Self::Fake),
            "1" | "real" => Ok(Self::Real),
            other => Err(PrepError::invalid(format!(
                "label must be 0/1 or fake/real, got '{}'",
                other
            ))),
        }
    }
}

/// Output resolution, height first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    pub height: u32,
    pub width: u32,
}

impl TargetSize {
    pub fn new(height: u32, width: u32) -> Result<Self> {
        let size = Self { height, width };
        size.validate()?;
        Ok(size)
    }

    pub fn square(side: u32) -> Result<Self> {
        Self::new(side, side)
    }

    pub fn validate(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(PrepError::invalid(format!(
                "target size must be non-zero, got {}x{}",
                self.height, self.width
            )));
        }
        Ok(())
    }

    /// Shape of one normalized image: `(height, width, 3)`.
    pub fn image_shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, 3)
    }

    pub fn pixel_values(&self) -> usize {
        self.height as usize * self.width as usize * 3
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self {
            height: 224,
            width: 224,
        }
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Parses `HxW` or a single side length.
impl FromStr for TargetSize {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| PrepError::invalid(format!("bad target size '{}': {}", s, e)))
        };
        match s.split_once(['x', 'X']) {
            Some((h, w)) => Self::new(parse(h)?, parse(w)?),
            None => Self::square(parse(s)?),
        }
    }
}

/// One labeled sample of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    pub path: PathBuf,
    pub label: Label,
}

impl ManifestRow {
    pub fn new(path: impl Into<PathBuf>, label: Label) -> Self {
        Self {
            path: path.into(),
            label,
        }
    }
}

/// Discrete decision derived from a model score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub label: Label,
    /// Always within `[0.5, 1.0]` for scores in `[0, 1]`.
    pub confidence: f32,
}

impl Verdict {
    /// Score is read as the probability of the image being real.
    pub fn from_score(score: f32) -> Self {
        if score >= 0.5 {
            Self {
                label: Label::Real,
                confidence: score,
            }
        } else {
            Self {
                label: Label::Fake,
                confidence: 1.0 - score,
            }
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}%)", self.label, self.confidence * 100.0)
    }
}
