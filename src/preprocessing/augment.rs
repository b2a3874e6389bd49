//! Random geometric augmentation applied to resized RGB images before
//! normalization. Every step draws from a caller-supplied RNG, so a seeded
//! RNG reproduces the exact same sequence of transforms.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center, translate};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single random transform.
pub trait AugmentStep: Send + Sync {
    fn apply(&self, image: RgbImage, rng: &mut dyn rand::RngCore) -> RgbImage;

    /// Human-readable name (used in debug logs)
    fn name(&self) -> &str;
}

/// Rotate about the centre by a uniform angle in `[-max_degrees, max_degrees]`.
pub struct RotateStep {
    pub max_degrees: f32,
}

impl AugmentStep for RotateStep {
    fn apply(&self, image: RgbImage, rng: &mut dyn rand::RngCore) -> RgbImage {
        if self.max_degrees <= 0.0 {
            return image;
        }
        let degrees = rng.gen_range(-self.max_degrees..=self.max_degrees);
        rotate_about_center(
            &image,
            degrees.to_radians(),
            Interpolation::Bilinear,
            Rgb([0, 0, 0]),
        )
    }

    fn name(&self) -> &str {
        "Rotation"
    }
}

/// Translate by up to a fraction of each dimension. Uncovered pixels take
/// the nearest edge value.
pub struct ShiftStep {
    pub width_fraction: f32,
    pub height_fraction: f32,
}

impl AugmentStep for ShiftStep {
    fn apply(&self, image: RgbImage, rng: &mut dyn rand::RngCore) -> RgbImage {
        let (width, height) = image.dimensions();
        let dx = random_offset(rng, self.width_fraction, width);
        let dy = random_offset(rng, self.height_fraction, height);
        if dx == 0 && dy == 0 {
            return image;
        }
        translate(&image, (dx, dy))
    }

    fn name(&self) -> &str {
        "Shift"
    }
}

fn random_offset(rng: &mut dyn rand::RngCore, fraction: f32, extent: u32) -> i32 {
    let max_shift = (fraction * extent as f32).floor() as i32;
    if max_shift <= 0 {
        return 0;
    }
    rng.gen_range(-max_shift..=max_shift)
}

/// Mirror left-right with probability one half.
pub struct FlipStep;

impl AugmentStep for FlipStep {
    fn apply(&self, image: RgbImage, rng: &mut dyn rand::RngCore) -> RgbImage {
        if rng.gen_bool(0.5) {
            image::imageops::flip_horizontal(&image)
        } else {
            image
        }
    }

    fn name(&self) -> &str {
        "Horizontal Flip"
    }
}

/// Augmentation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Augmentation {
    pub rotation_degrees: f32,
    pub width_shift: f32,
    pub height_shift: f32,
    pub horizontal_flip: bool,
}

impl Default for Augmentation {
    fn default() -> Self {
        Self {
            rotation_degrees: 20.0,
            width_shift: 0.2,
            height_shift: 0.2,
            horizontal_flip: true,
        }
    }
}

impl Augmentation {
    /// Build the ordered list of steps: rotate, shift, flip.
    pub fn steps(&self) -> Vec<Box<dyn AugmentStep>> {
        let mut steps: Vec<Box<dyn AugmentStep>> = vec![
            Box::new(RotateStep {
                max_degrees: self.rotation_degrees,
            }),
            Box::new(ShiftStep {
                width_fraction: self.width_shift,
                height_fraction: self.height_shift,
            }),
        ];
        if self.horizontal_flip {
            steps.push(Box::new(FlipStep));
        }
        steps
    }

    pub fn apply(&self, image: RgbImage, rng: &mut dyn rand::RngCore) -> RgbImage {
        self.steps().iter().fold(image, |img, step| {
            tracing::trace!(step = step.name(), "applying augmentation");
            step.apply(img, &mut *rng)
        })
    }
}
