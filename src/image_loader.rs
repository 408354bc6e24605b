//! # Image Loading and Decoding
//!
//! Prepares input images for PDF embedding. JPEG images pass through
//! without re-encoding (PDF supports DCTDecode natively). PNG images are
//! decoded to RGB pixels with a separate alpha channel for SMask
//! transparency.
//!
//! Which files are placed at all is decided by file name alone
//! ([`ImageKind::from_filename`]). Everything else is skipped without
//! being read.

use std::io::Cursor;

use log::{debug, warn};

use crate::error::GridError;
use crate::layout::ImageDescriptor;
use crate::model::{ImageEntry, ImageKind, ImageSource};

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub kind: ImageKind,
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone)]
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
    DeviceCMYK,
}

/// Input images after loading, aligned with the input list.
#[derive(Debug, Default)]
pub struct LoadedBatch {
    /// `None` where the input was skipped.
    pub images: Vec<Option<LoadedImage>>,
    /// Names of skipped inputs, in input order.
    pub skipped: Vec<String>,
}

impl LoadedBatch {
    /// Layout descriptors for every input, skipped ones included.
    pub fn descriptors(&self) -> Vec<ImageDescriptor> {
        self.images
            .iter()
            .enumerate()
            .map(|(i, img)| match img {
                Some(img) => ImageDescriptor::new(i, img.kind, img.width_px, img.height_px),
                None => ImageDescriptor::unsupported(i),
            })
            .collect()
    }
}

/// Decode every supported entry, skipping the rest.
///
/// The first decode failure aborts the whole batch.
pub fn load_supported(entries: &[ImageEntry]) -> Result<LoadedBatch, GridError> {
    let mut skipped = Vec::new();
    for entry in entries.iter().filter(|e| e.kind().is_none()) {
        debug!(name = entry.name.as_str(); "Skipping unsupported file");
        skipped.push(entry.name.clone());
    }
    if !skipped.is_empty() {
        warn!(
            "Ignoring {} file(s) that are not PNG or JPEG: {}",
            skipped.len(),
            skipped.join(", ")
        );
    }

    let images = decode_all(entries)?;
    Ok(LoadedBatch { images, skipped })
}

#[cfg(feature = "parallel")]
fn decode_all(entries: &[ImageEntry]) -> Result<Vec<Option<LoadedImage>>, GridError> {
    use rayon::prelude::*;

    entries.par_iter().map(load_if_supported).collect()
}

#[cfg(not(feature = "parallel"))]
fn decode_all(entries: &[ImageEntry]) -> Result<Vec<Option<LoadedImage>>, GridError> {
    entries.iter().map(load_if_supported).collect()
}

fn load_if_supported(entry: &ImageEntry) -> Result<Option<LoadedImage>, GridError> {
    match entry.kind() {
        Some(kind) => load_image(entry, kind).map(Some),
        None => Ok(None),
    }
}

/// Decode one entry as the given kind.
///
/// The actual format is detected from magic bytes, so a JPEG saved with a
/// `.png` name still loads.
pub fn load_image(entry: &ImageEntry, kind: ImageKind) -> Result<LoadedImage, GridError> {
    let loaded =
        decode_image_bytes(&entry.data).map_err(|msg| GridError::image(&entry.name, msg))?;
    if loaded.kind != kind {
        debug!(
            name = entry.name.as_str();
            "File contents are {} despite its extension", loaded.kind
        );
    }
    debug!(
        name = entry.name.as_str(),
        width = loaded.width_px,
        height = loaded.height_px;
        "Loaded image"
    );
    Ok(loaded)
}

/// Resolve a JSON image reference to its bytes.
///
/// Supported `src` formats:
/// - `data:image/...;base64,...`: data URI
/// - File path starting with `/`, `./` or `../`: read from disk
/// - Raw base64-encoded image data
pub fn resolve_source(source: &ImageSource) -> Result<ImageEntry, GridError> {
    let data = read_source_bytes(&source.src).map_err(|msg| GridError::image(&source.name, msg))?;
    Ok(ImageEntry::new(source.name.clone(), data))
}

/// Resolve every JSON image reference, in order.
///
/// Sources whose names will be skipped are not read; they come back with
/// empty data.
pub fn resolve_sources(sources: &[ImageSource]) -> Result<Vec<ImageEntry>, GridError> {
    sources
        .iter()
        .map(|source| match ImageKind::from_filename(&source.name) {
            Some(_) => resolve_source(source),
            None => Ok(ImageEntry::new(source.name.clone(), Vec::new())),
        })
        .collect()
}

fn read_source_bytes(src: &str) -> Result<Vec<u8>, String> {
    if src.starts_with("data:") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| "Invalid data URI: missing comma".to_string())?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    // Only explicit path prefixes, since base64 text may contain '/'.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        #[cfg(not(target_arch = "wasm32"))]
        {
            return std::fs::read(src).map_err(|e| format!("Failed to read '{}': {}", src, e));
        }
        #[cfg(target_arch = "wasm32")]
        {
            return Err(format!(
                "File path images not supported in WASM: '{}'. Use data URIs or base64.",
                src
            ));
        }
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| format!("Base64 decode error: {}", e))
}

/// Detect image format from magic bytes and decode accordingly.
fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, String> {
    if data.len() < 4 {
        return Err("Image data too short".to_string());
    }

    if is_jpeg(data) {
        decode_jpeg(data)
    } else if is_png(data) {
        decode_png(data)
    } else {
        Err("Unsupported image data (expected JPEG or PNG)".to_string())
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47]
}

/// JPEG: read dimensions only. The raw bytes go straight into the PDF.
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("JPEG format detection error: {}", e))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("Failed to read JPEG dimensions: {}", e))?;

    Ok(LoadedImage {
        kind: ImageKind::Jpeg,
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: detect_jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Scan JPEG markers for the SOF segment and map its component count to a
/// color space.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // past SOI
    while i + 3 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        // SOF: marker(2) + length(2) + precision(1) + height(2) + width(2) + components(1)
        if is_sof && i + 9 < data.len() {
            return match data[i + 9] {
                1 => JpegColorSpace::DeviceGray,
                4 => JpegColorSpace::DeviceCMYK,
                _ => JpegColorSpace::DeviceRGB,
            };
        }
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + seg_len;
    }
    JpegColorSpace::DeviceRGB
}

/// PNG: decode to RGBA, split into RGB + alpha.
fn decode_png(data: &[u8]) -> Result<LoadedImage, String> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| format!("Failed to decode PNG: {}", e))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }
    let has_transparency = alpha.iter().any(|&a| a != 255);

    Ok(LoadedImage {
        kind: ImageKind::Png,
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

    fn png_bytes(w: u32, h: u32, alpha: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 0, 0, alpha]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), w, h, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(w, h, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), w, h, image::ColorType::Rgb8)
            .unwrap();
        buf
    }

    #[test]
    fn test_magic_bytes() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(is_png(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_png(&[0x89, 0x50]));
    }

    #[test]
    fn test_too_short_and_unknown_data() {
        assert!(decode_image_bytes(&[0x00, 0x01]).is_err());
        assert!(decode_image_bytes(&[0x00, 0x01, 0x02, 0x03, 0x04]).is_err());
    }

    #[test]
    fn test_decode_opaque_png() {
        let loaded = decode_image_bytes(&png_bytes(3, 2, 255)).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (3, 2));
        assert_eq!(loaded.kind, ImageKind::Png);
        match &loaded.pixel_data {
            ImagePixelData::Decoded { rgb, alpha } => {
                assert_eq!(rgb.len(), 18);
                assert_eq!(&rgb[..3], &[255, 0, 0]);
                assert!(alpha.is_none(), "Fully opaque should have no alpha");
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_decode_png_with_alpha() {
        let loaded = decode_image_bytes(&png_bytes(1, 1, 128)).unwrap();
        match &loaded.pixel_data {
            ImagePixelData::Decoded { alpha, .. } => {
                assert_eq!(alpha.as_deref(), Some(&[128u8][..]));
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_jpeg_passes_through() {
        let bytes = jpeg_bytes(4, 2);
        let loaded = decode_image_bytes(&bytes).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (4, 2));
        match &loaded.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                assert_eq!(data, &bytes);
                assert_eq!(*color_space, JpegColorSpace::DeviceRGB);
            }
            _ => panic!("JPEG should stay as Jpeg variant"),
        }
    }

    #[test]
    fn test_content_wins_over_extension() {
        let entry = ImageEntry::new("photo.png", jpeg_bytes(2, 2));
        let loaded = load_image(&entry, ImageKind::Png).unwrap();
        assert_eq!(loaded.kind, ImageKind::Jpeg);
    }

    #[test]
    fn test_load_supported_skips_by_name() {
        let entries = vec![
            ImageEntry::new("a.png", png_bytes(2, 1, 255)),
            ImageEntry::new("notes.txt", b"hello".to_vec()),
            ImageEntry::new("b.JPG", jpeg_bytes(2, 2)),
        ];
        let batch = load_supported(&entries).unwrap();
        assert_eq!(batch.images.len(), 3);
        assert!(batch.images[1].is_none());
        assert_eq!(batch.skipped, vec!["notes.txt".to_string()]);

        let descriptors = batch.descriptors();
        assert_eq!(descriptors[0].kind, Some(ImageKind::Png));
        assert_eq!((descriptors[0].width_px, descriptors[0].height_px), (2, 1));
        assert_eq!(descriptors[1].kind, None);
        assert_eq!(descriptors[2].source_index, 2);
    }

    #[test]
    fn test_corrupt_supported_file_fails_batch() {
        let entries = vec![
            ImageEntry::new("a.png", png_bytes(1, 1, 255)),
            ImageEntry::new("broken.jpg", vec![0xFF, 0xD8, 0x00, 0x00, 0x00]),
        ];
        match load_supported(&entries) {
            Err(GridError::Image { name, .. }) => assert_eq!(name, "broken.jpg"),
            other => panic!("expected image error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_data_uri_and_raw_base64() {
        use base64::Engine;
        let png = png_bytes(1, 1, 255);
        let b64 = base64::engine::general_purpose::STANDARD.encode(&png);

        let uri = ImageSource {
            name: "a.png".to_string(),
            src: format!("data:image/png;base64,{}", b64),
        };
        assert_eq!(resolve_source(&uri).unwrap().data, png);

        let raw = ImageSource {
            name: "b.png".to_string(),
            src: b64,
        };
        assert_eq!(resolve_source(&raw).unwrap().data, png);
    }

    #[test]
    fn test_invalid_data_uri() {
        let source = ImageSource {
            name: "x.png".to_string(),
            src: "data:image/png;base64".to_string(),
        };
        assert!(matches!(resolve_source(&source), Err(GridError::Image { .. })));
    }

    #[test]
    fn test_resolve_missing_file() {
        let source = ImageSource {
            name: "gone.png".to_string(),
            src: "./definitely/not/here.png".to_string(),
        };
        assert!(resolve_source(&source).is_err());
    }
}
