use super::{DocRect, ViewportRect};

/// Nominal page dimensions, in the same space as OCR bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const DEFAULT: PageSize = PageSize {
        width: 800.0,
        height: 1000.0,
    };

    /// Resolves the dimensions a document reported, falling back per axis when
    /// a value is missing or unusable as a divisor.
    pub fn from_reported(width: Option<f64>, height: Option<f64>, fallback: PageSize) -> Self {
        Self {
            width: usable(width).unwrap_or(fallback.width),
            height: usable(height).unwrap_or(fallback.height),
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Displayed size of the rendered page image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Per-axis scale from document space to viewport space. Scaling is
/// anisotropic on purpose: it follows whatever stretch the displayed image has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ViewportTransform {
    /// Returns `None` when any dimension is not strictly positive; callers skip
    /// the render in that case.
    pub fn new(page: PageSize, viewport: ViewportSize) -> Option<Self> {
        let dims = [page.width, page.height, viewport.width, viewport.height];
        if dims.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return None;
        }
        Some(Self {
            scale_x: viewport.width / page.width,
            scale_y: viewport.height / page.height,
        })
    }

    pub fn apply(&self, bbox: &DocRect) -> ViewportRect {
        ViewportRect {
            x1: bbox.x1 * self.scale_x,
            y1: bbox.y1 * self.scale_y,
            x2: bbox.x2 * self.scale_x,
            y2: bbox.y2 * self.scale_y,
        }
    }
}

pub fn to_viewport_rect(
    bbox: &DocRect,
    page: PageSize,
    viewport: ViewportSize,
) -> Option<ViewportRect> {
    ViewportTransform::new(page, viewport).map(|transform| transform.apply(bbox))
}
