//! # Image Loading and Decoding
//!
//! Resolves an [`ImageSource`] to bytes and prepares them for PDF
//! embedding. Raw bytes pass through untouched; data URIs are decoded;
//! `http(s)` URLs are fetched with a timeout and a bounded number of
//! retries; anything else is read from disk.
//!
//! JPEG images pass through without re-encoding (the PDF spec supports
//! DCTDecode natively). Other formats are decoded to RGB pixels with a
//! separate alpha channel for SMask transparency.

use std::io::Cursor;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::FetchConfig;
use crate::error::{FolioError, Result};

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    /// A URL, data URI, or filesystem path.
    Uri(String),
    /// Encoded image bytes (PNG, JPEG, WebP).
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Short description used in error messages.
    fn describe(&self) -> String {
        match self {
            ImageSource::Uri(uri) if uri.starts_with("data:") => "data URI".to_string(),
            ImageSource::Uri(uri) => uri.clone(),
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    /// Width that preserves the native aspect ratio at the given height.
    pub fn width_for_height(&self, height: f64) -> f64 {
        if self.height_px == 0 {
            return height;
        }
        height * self.width_px as f64 / self.height_px as f64
    }
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Resolve and decode an image. Any failure is an `Asset` error.
pub fn load_image(source: &ImageSource, fetch: &FetchConfig) -> Result<LoadedImage> {
    let raw = match source {
        ImageSource::Bytes(bytes) => bytes.clone(),
        ImageSource::Uri(uri) => read_uri_bytes(uri, fetch)?,
    };
    decode_image_bytes(&raw).map_err(|reason| FolioError::asset(source.describe(), reason))
}

/// Read raw bytes behind a URI: data URI, remote URL, or file path.
pub(crate) fn read_uri_bytes(uri: &str, fetch: &FetchConfig) -> Result<Vec<u8>> {
    if uri.starts_with("data:") {
        let comma_pos = uri
            .find(',')
            .ok_or_else(|| FolioError::asset("data URI", "Invalid data URI: missing comma"))?;
        return base64_decode(&uri[comma_pos + 1..])
            .map_err(|reason| FolioError::asset("data URI", reason));
    }

    if uri.starts_with("http://") || uri.starts_with("https://") {
        return fetch_remote(uri, fetch);
    }

    let path = uri.strip_prefix("file://").unwrap_or(uri);
    std::fs::read(path).map_err(|e| FolioError::asset(uri, format!("Failed to read file: {}", e)))
}

/// Blocking fetch with a per-attempt timeout. Reads are idempotent, so a
/// failed attempt is simply retried up to `fetch.retries` times.
fn fetch_remote(url: &str, fetch: &FetchConfig) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FolioError::asset(url, format!("HTTP client error: {}", e)))?;

    let mut last_error = String::new();
    for attempt in 0..=fetch.retries {
        if attempt > 0 {
            log::warn!(
                "retrying image fetch {} ({}/{}): {}",
                url,
                attempt,
                fetch.retries,
                last_error
            );
        }
        let result = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes());
        match result {
            Ok(bytes) => {
                log::debug!("fetched {} ({} bytes)", url, bytes.len());
                return Ok(bytes.to_vec());
            }
            Err(e) if e.is_timeout() => {
                last_error = format!("timed out after {}s", fetch.timeout_secs);
            }
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(FolioError::asset(
        url,
        format!("Failed to download after {} attempt(s): {}", fetch.retries + 1, last_error),
    ))
}

fn base64_decode(input: &str) -> std::result::Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| format!("Base64 decode error: {}", e))
}

/// Detect image format from magic bytes and decode accordingly.
fn decode_image_bytes(data: &[u8]) -> std::result::Result<LoadedImage, String> {
    if data.len() < 4 {
        return Err("Image data too short".to_string());
    }

    if is_jpeg(data) {
        decode_jpeg(data)
    } else {
        decode_raster(data)
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

/// JPEG: read dimensions and color space without decoding pixels.
fn decode_jpeg(data: &[u8]) -> std::result::Result<LoadedImage, String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("JPEG format detection error: {}", e))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("Failed to read JPEG dimensions: {}", e))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: detect_jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Scan JPEG markers for the SOF segment and read its component count.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            // length(2) + precision(1) + height(2) + width(2) + num_components(1)
            return if data[i + 9] == 1 {
                JpegColorSpace::DeviceGray
            } else {
                JpegColorSpace::DeviceRGB
            };
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    JpegColorSpace::DeviceRGB
}

/// PNG/WebP: decode to RGBA, split into RGB + alpha.
fn decode_raster(data: &[u8]) -> std::result::Result<LoadedImage, String> {
    let img = image::load_from_memory(data)
        .map_err(|e| format!("Unsupported or corrupt image: {}", e))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
        has_transparency |= pixel[3] != 255;
    }

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: has_transparency.then_some(alpha),
        },
        width_px: width,
        height_px: height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32, alpha: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, alpha]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    #[test]
    fn test_is_jpeg() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_jpeg(&[0xFF]));
    }

    #[test]
    fn test_too_short_data() {
        assert!(decode_image_bytes(&[0x00, 0x01]).is_err());
    }

    #[test]
    fn test_undecodable_bytes_are_asset_errors() {
        let result = load_image(&ImageSource::Bytes(vec![0, 1, 2, 3, 4]), &FetchConfig::default());
        assert!(matches!(result, Err(FolioError::Asset { .. })));
    }

    #[test]
    fn test_invalid_data_uri() {
        let result = load_image(
            &ImageSource::Uri("data:image/png;base64".into()),
            &FetchConfig::default(),
        );
        assert!(matches!(result, Err(FolioError::Asset { .. })));
    }

    #[test]
    fn test_bytes_pass_through() {
        let loaded = load_image(&ImageSource::Bytes(png_bytes(4, 2, 255)), &FetchConfig::default())
            .unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (4, 2));
        assert!((loaded.width_for_height(32.0) - 64.0).abs() < 0.001);
        match &loaded.pixel_data {
            ImagePixelData::Decoded { rgb, alpha } => {
                assert_eq!(&rgb[..3], &[255, 0, 0]);
                assert!(alpha.is_none(), "Fully opaque should have no alpha");
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_png_with_alpha() {
        let loaded = decode_image_bytes(&png_bytes(1, 1, 128)).unwrap();
        match &loaded.pixel_data {
            ImagePixelData::Decoded { alpha, .. } => {
                assert_eq!(alpha.as_deref(), Some(&[128u8][..]));
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_jpeg_stays_encoded() {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ColorType::Rgb8)
            .unwrap();

        let loaded = decode_image_bytes(&buf).unwrap();
        match &loaded.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                assert!(data.starts_with(&[0xFF, 0xD8]));
                assert_eq!(*color_space, JpegColorSpace::DeviceRGB);
            }
            _ => panic!("JPEG should stay as Jpeg variant"),
        }
    }

    #[test]
    fn test_data_uri() {
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes(1, 1, 255));
        let uri = format!("data:image/png;base64,{}", b64);
        let loaded = load_image(&ImageSource::Uri(uri), &FetchConfig::default()).unwrap();
        assert_eq!(loaded.width_px, 1);
    }

    #[test]
    fn test_file_path() {
        let path = std::env::temp_dir().join(format!("folio-logo-{}.png", std::process::id()));
        std::fs::write(&path, png_bytes(3, 1, 255)).unwrap();
        let loaded = load_image(
            &ImageSource::Uri(path.to_string_lossy().into_owned()),
            &FetchConfig::default(),
        )
        .unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.width_px, 3);
    }

    #[test]
    fn test_missing_file() {
        let result = load_image(
            &ImageSource::Uri("/definitely/not/here/logo.png".into()),
            &FetchConfig::default(),
        );
        match result {
            Err(FolioError::Asset { source_ref, .. }) => {
                assert_eq!(source_ref, "/definitely/not/here/logo.png")
            }
            other => panic!("expected asset error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_url_fails_after_retries() {
        let fetch = FetchConfig {
            timeout_secs: 1,
            retries: 1,
        };
        let result = load_image(&ImageSource::Uri("http://127.0.0.1:9/logo.png".into()), &fetch);
        match result {
            Err(FolioError::Asset { reason, .. }) => assert!(reason.contains("2 attempt")),
            other => panic!("expected asset error, got {:?}", other),
        }
    }

    #[test]
    fn test_untagged_source_deserialization() {
        let uri: ImageSource = serde_json::from_str("\"https://x.test/logo.png\"").unwrap();
        assert_eq!(uri, ImageSource::Uri("https://x.test/logo.png".into()));
        let bytes: ImageSource = serde_json::from_str("[137, 80, 78, 71]").unwrap();
        assert_eq!(bytes, ImageSource::Bytes(vec![137, 80, 78, 71]));
    }
}
