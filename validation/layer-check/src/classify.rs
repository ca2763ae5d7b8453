//! Blank-preview detection.
//!
//! A preview whose first histogram bucket or 255 bucket holds every pixel is
//! uniformly black or white in the first channel and is treated as a failed
//! render. Only those two buckets are compared.

use std::path::PathBuf;

use image::DynamicImage;
use tracing::{debug, instrument, warn};
use wms_common::LayerId;

use crate::{Check, CheckError, CheckResult};

/// Per-channel histogram, flattened: `hist[channel * 256 + value]`.
///
/// 8-bit luma, luma-alpha, RGB and RGBA images are counted as stored; any
/// other pixel type is converted to RGBA8 first.
pub fn histogram(image: &DynamicImage) -> Vec<u64> {
    match image {
        DynamicImage::ImageLuma8(buf) => channel_histogram(buf.as_raw(), 1),
        DynamicImage::ImageLumaA8(buf) => channel_histogram(buf.as_raw(), 2),
        DynamicImage::ImageRgb8(buf) => channel_histogram(buf.as_raw(), 3),
        DynamicImage::ImageRgba8(buf) => channel_histogram(buf.as_raw(), 4),
        other => channel_histogram(other.to_rgba8().as_raw(), 4),
    }
}

fn channel_histogram(samples: &[u8], channels: usize) -> Vec<u64> {
    let mut hist = vec![0u64; channels * 256];
    for (i, &value) in samples.iter().enumerate() {
        hist[(i % channels) * 256 + value as usize] += 1;
    }
    hist
}

/// `Check::Invalid` when the image is uniformly 0 or uniformly 255.
pub fn classify_image(image: &DynamicImage) -> Check {
    let pixels = u64::from(image.width()) * u64::from(image.height());
    let hist = histogram(image);

    if hist[0] == pixels {
        debug!(pixels, "Preview is uniformly black");
        return Check::Invalid;
    }
    if hist[255] == pixels {
        debug!(pixels, "Preview is uniformly white");
        return Check::Invalid;
    }
    Check::Valid
}

/// Classifies stored previews.
pub struct ImageClassifier {
    image_dir: PathBuf,
    image_ext: String,
}

impl ImageClassifier {
    pub fn new(image_dir: impl Into<PathBuf>, image_ext: impl Into<String>) -> Self {
        Self {
            image_dir: image_dir.into(),
            image_ext: image_ext.into(),
        }
    }

    #[instrument(skip(self, id), fields(layer_id = %id))]
    pub async fn classify(&self, id: &LayerId) -> CheckResult<Check> {
        let path = self.image_dir.join(id.file_name(&self.image_ext));
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| CheckError::io(&path, e))?;
        let image = image::load_from_memory(&bytes).map_err(|source| CheckError::ImageDecode {
            id: id.to_string(),
            source,
        })?;

        let check = classify_image(&image);
        if check.is_valid() {
            debug!(width = image.width(), height = image.height(), "Preview has content");
        } else {
            warn!(path = %path.display(), "Preview is blank");
        }
        Ok(check)
    }
}
