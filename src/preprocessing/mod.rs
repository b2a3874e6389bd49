pub mod augment;
pub mod contrast;
pub mod loader;

use std::path::Path;

use ndarray::Array3;

pub use augment::{AugmentStep, Augmentation};
pub use contrast::{ContrastMode, ContrastNormalizer};
pub use loader::{ImageLoader, ResizeFilter, rgb_to_array};

use crate::error::Result;
use crate::models::TargetSize;

/// Load one image and normalize it to a `(height, width, 3)` array in `[0, 1]`.
pub fn preprocess_image(
    path: impl AsRef<Path>,
    target_size: TargetSize,
    stretch_contrast: bool,
) -> Result<Array3<f32>> {
    target_size.validate()?;
    let loader = ImageLoader::new(target_size);
    let normalizer = ContrastNormalizer::new(ContrastMode::from_stretch_flag(stretch_contrast));
    let rgb = loader.load(path.as_ref())?;
    Ok(normalizer.normalize(rgb_to_array(rgb)?.view()))
}
