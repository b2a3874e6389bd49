use ndarray::{ArrayView3, ArrayView4, Axis};

/// Values at or above this count as white.
pub const WHITE_THRESHOLD: f32 = 0.99;

/// Summary of one normalized image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Channel values `>= WHITE_THRESHOLD`, counted across all channels.
    pub white_pixels: usize,
    pub height: usize,
    pub width: usize,
}

impl ImageStats {
    pub fn of(image: ArrayView3<'_, f32>) -> Self {
        let (height, width, _) = image.dim();
        let (min, max) = min_max(image.iter().copied()).unwrap_or((0.0, 0.0));
        let mean = image.mean().unwrap_or(0.0);
        let white_pixels = image.iter().filter(|&&v| v >= WHITE_THRESHOLD).count();
        Self {
            min,
            max,
            mean,
            white_pixels,
            height,
            width,
        }
    }

    pub fn in_unit_range(&self) -> bool {
        self.min >= 0.0 && self.max <= 1.0
    }
}

/// Stats for the first `n` images of a batch.
pub fn batch_stats(images: ArrayView4<'_, f32>, n: usize) -> Vec<ImageStats> {
    images
        .axis_iter(Axis(0))
        .take(n)
        .map(ImageStats::of)
        .collect()
}

/// Smallest and largest value in the whole tensor.
pub fn value_range(images: ArrayView4<'_, f32>) -> Option<(f32, f32)> {
    min_max(images.iter().copied())
}

fn min_max(values: impl Iterator<Item = f32>) -> Option<(f32, f32)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Array4};

    #[test]
    fn stats_of_simple_image() {
        let mut img = Array3::<f32>::zeros((2, 2, 3));
        img[[0, 0, 0]] = 1.0;
        img[[0, 0, 1]] = 0.995;
        img[[1, 1, 2]] = 0.5;
        let stats = ImageStats::of(img.view());
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.white_pixels, 2);
        assert_eq!((stats.height, stats.width), (2, 2));
        assert!((stats.mean - 2.495 / 12.0).abs() < 1e-6);
        assert!(stats.in_unit_range());
    }

    #[test]
    fn batch_stats_takes_prefix() {
        let images = Array4::<f32>::from_shape_fn((4, 1, 1, 3), |(i, ..)| i as f32 / 4.0);
        let stats = batch_stats(images.view(), 2);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[1].max, 0.25);
        assert_eq!(value_range(images.view()), Some((0.0, 0.75)));
    }

    #[test]
    fn empty_tensor_has_no_range() {
        let images = Array4::<f32>::zeros((0, 2, 2, 3));
        assert_eq!(value_range(images.view()), None);
        assert!(batch_stats(images.view(), 5).is_empty());
    }
}
