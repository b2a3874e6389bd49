use std::path::{Path, PathBuf};

use faceprep::{Classifier, Label, ManifestRow, TargetSize};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::ArrayView4;

/// Writes an RGB image built from `pixel` into `dir`.
/// The format follows the file extension of `name`.
pub fn write_image(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    pixel: impl Fn(u32, u32) -> Rgb<u8>,
) -> PathBuf {
    let img = RgbImage::from_fn(width, height, pixel);
    let path = dir.join(name);
    img.save(&path).expect("Failed to save test image");
    path
}

/// 40x30 diagonal gradient, distinct per `seed`.
pub fn gradient_image(dir: &Path, name: &str, seed: u8) -> PathBuf {
    write_image(dir, name, 40, 30, move |x, y| {
        Rgb([
            (x * 5) as u8 ^ seed,
            (y * 7) as u8,
            ((x + y) * 3) as u8 / 2 + seed / 4,
        ])
    })
}

/// Uniform image with every channel at `value`.
pub fn solid_image(dir: &Path, name: &str, value: u8) -> PathBuf {
    write_image(dir, name, 16, 16, move |_, _| Rgb([value, value, value]))
}

/// 16x12 indexed-color image, black on the left half and white on the
/// right. GIF stores pixels as palette indices.
pub fn palette_image(dir: &Path, name: &str) -> PathBuf {
    let img = RgbaImage::from_fn(16, 12, |x, _| {
        if x < 8 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    let path = dir.join(name);
    img.save_with_format(&path, ImageFormat::Gif)
        .expect("Failed to save palette image");
    path
}

/// Small target size to keep test tensors cheap.
pub fn small_size() -> TargetSize {
    TargetSize {
        height: 12,
        width: 16,
    }
}

/// `count` gradient images in `dir`, alternating real/fake labels.
pub fn gradient_manifest(dir: &Path, count: usize) -> Vec<ManifestRow> {
    (0..count)
        .map(|i| {
            let path = gradient_image(dir, &format!("img_{:03}.png", i), (i * 37) as u8);
            let label = if i % 2 == 0 { Label::Real } else { Label::Fake };
            ManifestRow::new(path, label)
        })
        .collect()
}

/// Model stand-in that always returns the same score.
pub struct FixedScore(pub f32);

impl Classifier for FixedScore {
    fn predict(&self, _input: ArrayView4<'_, f32>) -> faceprep::Result<f32> {
        Ok(self.0)
    }
}

/// Model stand-in that scores by mean brightness.
pub struct Brightness;

impl Classifier for Brightness {
    fn predict(&self, input: ArrayView4<'_, f32>) -> faceprep::Result<f32> {
        Ok(input.mean().unwrap_or(0.0))
    }
}
