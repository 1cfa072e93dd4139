//! Screen grabbing and the downscale/recompress step before upload.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::config::ImageBounds;
use crate::error::ClientError;

/// Something that can produce a full-screen RGBA frame.
pub trait ScreenSource: Send {
    fn capture(&mut self) -> Result<RgbaImage, ClientError>;

    /// Short backend name for the startup log.
    fn backend(&self) -> &'static str {
        "custom"
    }
}

/// Primary monitor via `xcap`.
#[cfg(feature = "xcap")]
pub struct PrimaryMonitor;

#[cfg(feature = "xcap")]
impl ScreenSource for PrimaryMonitor {
    fn capture(&mut self) -> Result<RgbaImage, ClientError> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| ClientError::Capture(format!("failed to enumerate monitors: {}", e)))?;

        let monitor = monitors
            .iter()
            .find(|m| m.is_primary())
            .or_else(|| monitors.first())
            .ok_or_else(|| ClientError::Capture("no monitors found".into()))?;

        let frame = monitor
            .capture_image()
            .map_err(|e| ClientError::Capture(e.to_string()))?;

        // Rebuild through raw pixels so the xcap and local `image` versions need not match.
        let (width, height) = (frame.width(), frame.height());
        RgbaImage::from_raw(width, height, frame.into_raw())
            .ok_or_else(|| ClientError::Capture("frame buffer size mismatch".into()))
    }

    fn backend(&self) -> &'static str {
        "xcap"
    }
}

/// Stand-in used when the binary is built without a capture backend.
pub struct Unsupported;

impl ScreenSource for Unsupported {
    fn capture(&mut self) -> Result<RgbaImage, ClientError> {
        Err(ClientError::Capture(
            "built without screen capture support (enable the `xcap` feature)".into(),
        ))
    }

    fn backend(&self) -> &'static str {
        "none"
    }
}

pub fn default_source() -> Box<dyn ScreenSource> {
    #[cfg(feature = "xcap")]
    {
        Box::new(PrimaryMonitor)
    }
    #[cfg(not(feature = "xcap"))]
    {
        Box::new(Unsupported)
    }
}

impl<S: ScreenSource + ?Sized> ScreenSource for Box<S> {
    fn capture(&mut self) -> Result<RgbaImage, ClientError> {
        (**self).capture()
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}

/// Fits the frame inside the bounds (never upscaling) and encodes it as JPEG.
pub fn encode_capture(frame: RgbaImage, bounds: &ImageBounds) -> Result<Vec<u8>, ClientError> {
    let mut image = DynamicImage::ImageRgba8(frame);
    if image.width() > bounds.max_width || image.height() > bounds.max_height {
        image = image.resize(bounds.max_width, bounds.max_height, FilterType::Triangle);
    }

    // JPEG has no alpha channel
    let rgb = image.to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, bounds.jpeg_quality).encode_image(&rgb)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> ImageBounds {
        ImageBounds {
            max_width: 320,
            max_height: 180,
            jpeg_quality: 60,
        }
    }

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        })
    }

    #[test]
    fn large_frames_are_scaled_to_fit() {
        let jpeg = encode_capture(gradient(1920, 1080), &bounds()).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 180));
    }

    #[test]
    fn aspect_ratio_is_preserved() {
        let jpeg = encode_capture(gradient(1000, 1000), &bounds()).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (180, 180));
    }

    #[test]
    fn small_frames_are_not_upscaled() {
        let jpeg = encode_capture(gradient(100, 50), &bounds()).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }

    #[test]
    fn unsupported_source_reports_a_capture_error() {
        let err = Unsupported.capture().unwrap_err();
        assert!(matches!(err, ClientError::Capture(_)));
    }

    #[cfg(feature = "xcap")]
    #[test]
    fn default_build_captures_the_primary_monitor() {
        assert_eq!(default_source().backend(), "xcap");
    }

    #[cfg(not(feature = "xcap"))]
    #[test]
    fn build_without_backend_falls_back_to_unsupported() {
        assert_eq!(default_source().backend(), "none");
    }
}
