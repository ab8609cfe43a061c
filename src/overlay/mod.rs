mod geom;
mod render;

pub use geom::{PageSize, ViewportSize, ViewportTransform, to_viewport_rect};
pub use render::{
    BoxStyle, OverlayStyle, RenderOutcome, Surface, SvgSurface, rasterize_svg, render_boxes,
};

use serde::{Deserialize, Serialize};

/// Rectangle in document pixel coordinates, serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct DocRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl DocRect {
    /// Corners are reordered so the rectangle is never inverted.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }
}

impl From<[f64; 4]> for DocRect {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<DocRect> for [f64; 4] {
    fn from(rect: DocRect) -> Self {
        [rect.x1, rect.y1, rect.x2, rect.y2]
    }
}

/// Rectangle in the pixel space of the rendered image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl ViewportRect {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// One OCR text line. `bbox` keeps `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedLine {
    pub text: String,
    pub bbox: DocRect,
}

impl RecognizedLine {
    pub fn new(text: impl Into<String>, bbox: DocRect) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}
