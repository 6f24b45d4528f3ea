//! Image loading and thumbnail reduction
//!
//! Share requests may reference an image by inline `data:` URL, remote
//! `http(s)` URL, `file://` URL, or a bare filesystem path. Whatever the
//! source, WeChat caps thumbnails at 128 KiB, so loaded images go through a
//! two-phase reduction: JPEG quality first (cheap, preserves framing), then
//! a single spatial downscale as a last resort.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::debug;
use reqwest::Client;

use crate::error::{BridgeError, MediaError};

/// Longest-edge cap for the primary image of an image share.
pub const PRIMARY_MAX_EDGE: u32 = 1280;
/// Longest-edge cap for cosmetic thumbnails.
pub const THUMB_MAX_EDGE: u32 = 512;
/// WeChat's thumbnail byte ceiling.
pub const MAX_THUMB_BYTES: usize = 128 * 1024;

const QUALITY_START: u8 = 90;
const QUALITY_FLOOR: u8 = 10;
const QUALITY_STEP: u8 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const FETCH_TIMEOUT_SECS: u64 = 15;

/// Fetches and decodes images from the source encodings a share may carry.
#[derive(Debug, Clone)]
pub struct MediaLoader {
    http: Client,
}

impl MediaLoader {
    /// Create a loader with the default fetch timeouts.
    pub fn new() -> Result<Self, BridgeError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(MediaError::Fetch)?;
        Ok(Self { http })
    }

    /// Create a loader around an existing HTTP client.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Load and decode an image from an inspectable source string.
    ///
    /// Recognized schemes: `data:` (base64 after the comma), `http://`,
    /// `https://`, `file://`, and bare filesystem paths. Every failure mode
    /// is a distinct [`MediaError`]; this never yields an empty image.
    pub async fn load(&self, source: &str) -> Result<DynamicImage, BridgeError> {
        if source.is_empty() {
            return Err(MediaError::NotFound(String::new()).into());
        }

        if let Some(inline) = source.strip_prefix("data:") {
            let encoded = match inline.find(',') {
                Some(comma) => &inline[comma + 1..],
                None => inline,
            };
            let bytes = STANDARD.decode(encoded).map_err(MediaError::InlineData)?;
            return decode(bytes).await;
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            debug!("fetching share media from {source}");
            let response = self.http.get(source).send().await.map_err(MediaError::Fetch)?;
            let status = response.status();
            if !status.is_success() {
                return Err(MediaError::Status {
                    status: status.as_u16(),
                    url: source.to_string(),
                }
                .into());
            }
            let bytes = response.bytes().await.map_err(MediaError::Fetch)?;
            return decode(bytes.to_vec()).await;
        }

        if let Some(path) = source.strip_prefix("file://") {
            return load_file(Path::new(path)).await;
        }

        // Other schemes (content://, asset://, ...) belong to platform
        // adapters, not the bridge core.
        if source.contains("://") {
            return Err(MediaError::UnsupportedScheme(source.to_string()).into());
        }

        let path = Path::new(source);
        if !path.exists() {
            return Err(MediaError::NotFound(source.to_string()).into());
        }
        load_file(path).await
    }
}

async fn load_file(path: &Path) -> Result<DynamicImage, BridgeError> {
    let bytes = tokio::fs::read(path).await.map_err(MediaError::Io)?;
    decode(bytes).await
}

/// Decode off the caller's task; decoding a large image is CPU-bound.
async fn decode(bytes: Vec<u8>) -> Result<DynamicImage, BridgeError> {
    let decoded = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes).map_err(MediaError::Image)
    })
    .await
    .map_err(|e| MediaError::Worker(e.to_string()))??;
    Ok(decoded)
}

/// Cap an image's longest edge, preserving aspect ratio.
///
/// Images already within the bound pass through untouched.
pub fn scale_down(image: DynamicImage, max_edge: u32) -> DynamicImage {
    if image.width() <= max_edge && image.height() <= max_edge {
        return image;
    }
    image.resize(max_edge, max_edge, FilterType::Triangle)
}

/// Re-encode an image as JPEG under a byte ceiling.
///
/// Quality drops from 90 in steps of 10 down to a floor of 10; if the bytes
/// still exceed the ceiling at the floor, both dimensions are divided by
/// `sqrt(len / ceiling)` and the image is encoded once more at the floor
/// quality. The result can exceed the ceiling only in the degenerate case
/// where even that last pass cannot fit, in which case the best-effort bytes
/// are returned rather than looping.
pub fn compress_to_ceiling(image: &DynamicImage, ceiling: usize) -> Result<Vec<u8>, MediaError> {
    let mut quality = QUALITY_START;
    let mut data = encode_jpeg(image, quality)?;

    while data.len() > ceiling && quality > QUALITY_FLOOR {
        quality -= QUALITY_STEP;
        data = encode_jpeg(image, quality)?;
    }

    if data.len() > ceiling {
        let overshoot = (data.len() as f64 / ceiling as f64).sqrt();
        let width = ((image.width() as f64 / overshoot) as u32).max(1);
        let height = ((image.height() as f64 / overshoot) as u32).max(1);
        debug!(
            "thumbnail still {} bytes at quality floor, downscaling to {width}x{height}",
            data.len()
        );
        let resized = image.resize_exact(width, height, FilterType::Triangle);
        data = encode_jpeg(&resized, quality)?;
    }

    Ok(data)
}

/// Scale to the thumbnail edge cap and compress under the WeChat ceiling.
pub fn build_thumbnail(image: DynamicImage, max_edge: u32) -> Result<Vec<u8>, MediaError> {
    compress_to_ceiling(&scale_down(image, max_edge), MAX_THUMB_BYTES)
}

/// Lossless PNG bytes for the primary image of an image share.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, MediaError> {
    let mut data = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut data), ImageFormat::Png)?;
    Ok(data)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, MediaError> {
    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();
    let mut data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut data, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(data)
}
