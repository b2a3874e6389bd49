use std::path::Path;

use image::RgbImage;
use ndarray::Array3;

use crate::config::PreprocessConfig;
use crate::error::Result;
use crate::models::TargetSize;
use crate::preprocessing::{
    Augmentation, ContrastMode, ContrastNormalizer, ImageLoader, ResizeFilter, rgb_to_array,
};

/// Composable preprocessing chain: load, optional augment, normalize.
///
/// The deterministic path ([`Preprocessor::process_path`]) never augments;
/// augmentation only runs through [`Preprocessor::process_augmented`] with
/// an explicit RNG.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    loader: ImageLoader,
    normalizer: ContrastNormalizer,
    augmentation: Option<Augmentation>,
}

impl Preprocessor {
    /// 224x224, bicubic resize, max-stretch contrast, no augmentation
    pub fn new() -> Self {
        Self {
            loader: ImageLoader::new(TargetSize::default()),
            normalizer: ContrastNormalizer::default(),
            augmentation: None,
        }
    }

    pub fn from_config(config: &PreprocessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new()
            .with_target_size(config.target_size)
            .with_filter(config.filter)
            .with_contrast(config.contrast)
            .with_augmentation(config.augmentation))
    }

    pub fn with_target_size(mut self, target_size: TargetSize) -> Self {
        self.loader.target_size = target_size;
        self
    }

    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.loader.filter = filter;
        self
    }

    pub fn with_contrast(mut self, mode: ContrastMode) -> Self {
        self.normalizer.mode = mode;
        self
    }

    pub fn with_augmentation(mut self, augmentation: Option<Augmentation>) -> Self {
        self.augmentation = augmentation;
        self
    }

    pub fn target_size(&self) -> TargetSize {
        self.loader.target_size
    }

    pub fn contrast(&self) -> ContrastMode {
        self.normalizer.mode
    }

    pub fn augmentation(&self) -> Option<&Augmentation> {
        self.augmentation.as_ref()
    }

    /// Check the parameters before any image is touched.
    pub fn validate(&self) -> Result<()> {
        self.loader.target_size.validate()?;
        self.normalizer.mode.validate()
    }

    pub fn process_path(&self, path: &Path) -> Result<Array3<f32>> {
        self.validate()?;
        let rgb = self.loader.load(path)?;
        self.normalize(rgb)
    }

    pub fn process_bytes(&self, bytes: &[u8], name: &Path) -> Result<Array3<f32>> {
        self.validate()?;
        let rgb = self.loader.load_bytes(bytes, name)?;
        self.normalize(rgb)
    }

    /// Like [`Preprocessor::process_path`], with the configured augmentation
    /// applied between resize and normalization.
    pub fn process_augmented(
        &self,
        path: &Path,
        rng: &mut dyn rand::RngCore,
    ) -> Result<Array3<f32>> {
        self.validate()?;
        let mut rgb = self.loader.load(path)?;
        if let Some(augmentation) = &self.augmentation {
            rgb = augmentation.apply(rgb, rng);
        }
        self.normalize(rgb)
    }

    fn normalize(&self, rgb: RgbImage) -> Result<Array3<f32>> {
        let raw = rgb_to_array(rgb)?;
        Ok(self.normalizer.normalize(raw.view()))
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let size = TargetSize { height: 32, width: 48 };
        let pre = Preprocessor::new()
            .with_target_size(size)
            .with_contrast(ContrastMode::None);
        assert_eq!(pre.target_size(), size);
        assert_eq!(pre.contrast(), ContrastMode::None);
        assert!(pre.augmentation().is_none());
    }

    #[test]
    fn validate_rejects_zero_size() {
        let pre = Preprocessor::new().with_target_size(TargetSize { height: 0, width: 10 });
        assert!(pre.validate().is_err());
    }

    #[test]
    fn processing_rejects_invalid_settings_before_decoding() {
        let pre = Preprocessor::new().with_contrast(ContrastMode::Percentile {
            low: 2.0,
            high: 150.0,
        });
        let err = pre.process_path(Path::new("/not/read.png")).unwrap_err();
        assert!(matches!(err, crate::error::PrepError::InvalidParameter(_)));
        let err = pre.process_bytes(b"", Path::new("upload")).unwrap_err();
        assert!(matches!(err, crate::error::PrepError::InvalidParameter(_)));
    }

    #[test]
    fn from_config_carries_augmentation() {
        let config = PreprocessConfig {
            augmentation: Some(Augmentation::default()),
            ..PreprocessConfig::default()
        };
        let pre = Preprocessor::from_config(&config).unwrap();
        assert_eq!(pre.augmentation(), Some(&Augmentation::default()));
    }
}
