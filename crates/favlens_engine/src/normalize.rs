use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageFormat;

/// A candidate or reference image re-encoded as PNG and base64'd for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    encoded: String,
    source_format: ImageFormat,
    width: u32,
    height: u32,
}

impl NormalizedImage {
    /// Standard base64 of the canonical PNG bytes.
    pub fn as_base64(&self) -> &str {
        &self.encoded
    }

    pub fn source_format(&self) -> ImageFormat {
        self.source_format
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    UnrecognizedFormat,
    #[error("failed to decode {format} image: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },
    #[error("failed to encode png: {message}")]
    Encode { message: String },
}

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const ICO_MAGIC: &[u8] = &[0x00, 0x00, 0x01, 0x00];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Detects one of the supported raster formats from its leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(PNG_MAGIC) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some(ImageFormat::WebP)
    } else if bytes.starts_with(ICO_MAGIC) {
        Some(ImageFormat::Ico)
    } else if bytes.starts_with(b"BM") {
        Some(ImageFormat::Bmp)
    } else {
        None
    }
}

/// Decode any supported format and produce the base64 of a PNG rendition.
///
/// PNG input is validated by decoding but its original bytes are kept as-is.
pub fn normalize_image(bytes: &[u8]) -> Result<NormalizedImage, DecodeError> {
    let format = sniff_format(bytes).ok_or(DecodeError::UnrecognizedFormat)?;
    let image =
        image::load_from_memory_with_format(bytes, format).map_err(|err| DecodeError::Decode {
            format: format_label(format),
            message: err.to_string(),
        })?;

    let encoded = if format == ImageFormat::Png {
        BASE64.encode(bytes)
    } else {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|err| DecodeError::Encode {
                message: err.to_string(),
            })?;
        BASE64.encode(png.into_inner())
    };

    Ok(NormalizedImage {
        encoded,
        source_format: format,
        width: image.width(),
        height: image.height(),
    })
}

pub(crate) fn format_label(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::WebP => "WebP",
        ImageFormat::Ico => "ICO",
        ImageFormat::Bmp => "BMP",
        _ => "unknown",
    }
}
