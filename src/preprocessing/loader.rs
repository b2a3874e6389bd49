use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader, RgbImage};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::models::TargetSize;

/// Interpolation used when resizing to the target resolution.
/// All variants are deterministic for identical input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl FromStr for ResizeFilter {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "bilinear" => Ok(Self::Triangle),
            "catmull-rom" | "catmullrom" | "bicubic" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" => Ok(Self::Lanczos3),
            other => Err(PrepError::invalid(format!("unknown resize filter '{}'", other))),
        }
    }
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Decodes images and brings them to a fixed RGB resolution.
#[derive(Debug, Clone, Copy)]
pub struct ImageLoader {
    pub target_size: TargetSize,
    pub filter: ResizeFilter,
}

impl ImageLoader {
    pub fn new(target_size: TargetSize) -> Self {
        Self {
            target_size,
            filter: ResizeFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Open, decode and resize the image at `path`.
    pub fn load(&self, path: &Path) -> Result<RgbImage> {
        let decoded = decode_file(path).map_err(|source| PrepError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.fit(&decoded))
    }

    /// Same as [`ImageLoader::load`] for an in-memory encoded image.
    /// `name` is only used for error reporting.
    pub fn load_bytes(&self, bytes: &[u8], name: &Path) -> Result<RgbImage> {
        let decoded = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(ImageError::IoError)
            .and_then(|reader| reader.decode())
            .map_err(|source| PrepError::Decode {
                path: name.to_path_buf(),
                source,
            })?;
        Ok(self.fit(&decoded))
    }

    /// Coerce any color mode to 3-channel RGB, then resize exactly.
    pub fn fit(&self, image: &DynamicImage) -> RgbImage {
        let rgb = image.to_rgb8();
        let TargetSize { height, width } = self.target_size;
        if rgb.dimensions() == (width, height) {
            return rgb;
        }
        image::imageops::resize(&rgb, width, height, self.filter.into())
    }
}

fn decode_file(path: &Path) -> std::result::Result<DynamicImage, ImageError> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::IoError)?
        .decode()
}

/// View an RGB image as a `(height, width, 3)` array.
pub fn rgb_to_array(image: RgbImage) -> Result<Array3<u8>> {
    let (width, height) = image.dimensions();
    let array = Array3::from_shape_vec((height as usize, width as usize, 3), image.into_raw())?;
    Ok(array)
}
