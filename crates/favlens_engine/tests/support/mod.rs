#![allow(dead_code)]

use std::io::{self, Cursor};
use std::sync::{Arc, Mutex, Once};

use favlens_engine::MatchSink;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// 16x16 two-colour checkerboard; few enough colours for a lossless GIF.
pub fn checkerboard(primary: [u8; 3]) -> RgbaImage {
    let [r, g, b] = primary;
    RgbaImage::from_fn(16, 16, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgba([r, g, b, 255])
        } else {
            Rgba([240, 240, 240, 255])
        }
    })
}

pub fn encode(image: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let dynamic = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image.clone()).to_rgb8())
    } else {
        DynamicImage::ImageRgba8(image.clone())
    };
    let mut buf = Cursor::new(Vec::new());
    dynamic.write_to(&mut buf, format).expect("encode test image");
    buf.into_inner()
}

pub fn png(primary: [u8; 3]) -> Vec<u8> {
    encode(&checkerboard(primary), ImageFormat::Png)
}

/// Collects reported matches so tests can inspect them after the sink moved.
#[derive(Clone, Default)]
pub struct SharedSink {
    pub urls: Arc<Mutex<Vec<String>>>,
}

impl SharedSink {
    pub fn taken(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl MatchSink for SharedSink {
    fn label(&self) -> &str {
        "shared"
    }

    fn report_match(&mut self, url: &str) -> io::Result<()> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
