use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::overlay::{BoxStyle, DocRect, RecognizedLine, Surface, ViewportRect, ViewportSize};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawCall {
    pub(crate) rect: ViewportRect,
    pub(crate) style: BoxStyle,
}

/// Surface that records every stroke in order.
pub(crate) struct RecordingSurface {
    size: ViewportSize,
    pub(crate) clears: usize,
    pub(crate) calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub(crate) fn new(width: f64, height: f64) -> Self {
        Self {
            size: ViewportSize::new(width, height),
            clears: 0,
            calls: Vec::new(),
        }
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> ViewportSize {
        self.size
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.calls.clear();
    }

    fn stroke_rect(&mut self, rect: &ViewportRect, style: &BoxStyle) {
        self.calls.push(DrawCall {
            rect: *rect,
            style: style.clone(),
        });
    }
}

pub(crate) fn line(text: &str, bbox: [f64; 4]) -> RecognizedLine {
    RecognizedLine::new(text, DocRect::from(bbox))
}

/// A blank white PNG of the given size as a `data:` URI.
pub(crate) fn png_data_url(width: u32, height: u32) -> String {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    format!("data:image/png;base64,{}", BASE64.encode(bytes))
}
