//! Binary image and video assets exchanged with the remote collaborator.

use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

use crate::geometry::PixelSize;

pub const MIME_PNG: &str = "image/png";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to decode image {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to read image header for {name}: {source}")]
    Header {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode image {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("malformed data url: {message}")]
    MalformedDataUrl { message: String },
}

pub type AssetResult<T> = std::result::Result<T, AssetError>;

/// One immutable image state. Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Arc<[u8]>,
    mime: String,
    name: String,
}

impl Snapshot {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        mime: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
            name: name.into(),
        }
    }

    /// Encodes a decoded image as PNG and wraps it in a snapshot.
    pub fn from_image(image: &DynamicImage, name: impl Into<String>) -> AssetResult<Self> {
        let name = name.into();
        let bytes = encode_png(image, &name)?;
        Ok(Self::new(bytes, MIME_PNG, name))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the natural pixel dimensions from the encoded header.
    pub fn natural_size(&self) -> AssetResult<PixelSize> {
        let reader = image::ImageReader::new(Cursor::new(self.bytes()))
            .with_guessed_format()
            .map_err(|source| AssetError::Header {
                name: self.name.clone(),
                source,
            })?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|source| AssetError::Decode {
                name: self.name.clone(),
                source,
            })?;
        Ok(PixelSize::new(width, height))
    }

    pub fn decode(&self) -> AssetResult<DynamicImage> {
        image::load_from_memory(self.bytes()).map_err(|source| AssetError::Decode {
            name: self.name.clone(),
            source,
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(self.bytes()))
    }

    pub fn from_data_url(url: &str, name: impl Into<String>) -> AssetResult<Self> {
        let (mime, bytes) = parse_data_url(url)?;
        Ok(Self::new(bytes, mime, name))
    }
}

/// An exported mask image: black background, white painted region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskAsset {
    pub png: Vec<u8>,
    pub size: PixelSize,
    pub painted_pixels: u64,
}

impl MaskAsset {
    pub const fn is_blank(&self) -> bool {
        self.painted_pixels == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    pub bytes: Arc<[u8]>,
    pub mime: String,
}

impl VideoAsset {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }
}

pub(crate) fn encode_png(image: &DynamicImage, name: &str) -> AssetResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|source| AssetError::Encode {
            name: name.to_string(),
            source,
        })?;
    Ok(cursor.into_inner())
}

fn parse_data_url(url: &str) -> AssetResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::MalformedDataUrl {
            message: "missing data: scheme".to_string(),
        })?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::MalformedDataUrl {
            message: "missing payload separator".to_string(),
        })?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| AssetError::MalformedDataUrl {
            message: "only base64 payloads are supported".to_string(),
        })?;
    if mime.is_empty() {
        return Err(AssetError::MalformedDataUrl {
            message: "missing mime type".to_string(),
        });
    }
    let bytes = BASE64
        .decode(payload)
        .map_err(|err| AssetError::MalformedDataUrl {
            message: err.to_string(),
        })?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32, name: &str) -> Snapshot {
    let image = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([40, 80, 120, 255]),
    ));
    Snapshot::from_image(&image, name).expect("test image should encode")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_size_reads_png_header() {
        let snapshot = test_png(32, 18, "a.png");
        assert_eq!(snapshot.natural_size().unwrap(), PixelSize::new(32, 18));
        assert_eq!(snapshot.mime(), MIME_PNG);
    }

    #[test]
    fn natural_size_fails_for_garbage_bytes() {
        let snapshot = Snapshot::new(vec![1_u8, 2, 3], "image/png", "broken");
        assert!(snapshot.natural_size().is_err());
    }

    #[test]
    fn data_url_keeps_mime_and_bytes() {
        let snapshot = Snapshot::new(vec![0_u8, 159, 255], "image/webp", "x");
        let url = snapshot.to_data_url();
        assert!(url.starts_with("data:image/webp;base64,"));

        let parsed = Snapshot::from_data_url(&url, "x").unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn data_url_rejects_non_base64_payloads() {
        let err = Snapshot::from_data_url("data:text/plain,hello", "x").unwrap_err();
        assert!(matches!(err, AssetError::MalformedDataUrl { .. }));
    }

    #[test]
    fn snapshot_clones_share_bytes() {
        let snapshot = test_png(4, 4, "a.png");
        let view = snapshot.clone();
        assert!(std::ptr::eq(snapshot.bytes().as_ptr(), view.bytes().as_ptr()));
    }
}
