use anyhow::{Context, Result, anyhow};
use std::io::Cursor;
use tiny_skia::Pixmap;
use usvg::{Options, Tree};

use super::geom::{PageSize, ViewportSize, ViewportTransform};
use super::{RecognizedLine, ViewportRect};

/// Stroke style for one layer of boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStyle {
    pub color: String,
    pub opacity: f32,
    pub stroke_width: f32,
}

/// The two layers: every recognized line, then the evidence lines on top.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub base: BoxStyle,
    pub highlight: BoxStyle,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            base: BoxStyle {
                color: "#000000".to_string(),
                opacity: 0.3,
                stroke_width: 1.0,
            },
            highlight: BoxStyle {
                color: "#ff0000".to_string(),
                opacity: 1.0,
                stroke_width: 2.0,
            },
        }
    }
}

/// A 2-D drawing target sized to the displayed page image.
pub trait Surface {
    fn size(&self) -> ViewportSize;
    fn clear(&mut self);
    fn stroke_rect(&mut self, rect: &ViewportRect, style: &BoxStyle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Drawn { base: usize, highlighted: usize },
    Skipped,
}

/// Full redraw: clear, low-emphasis box per line, then high-emphasis box per
/// highlighted line. Nothing is drawn when the surface or page has no area.
pub fn render_boxes<S: Surface + ?Sized>(
    surface: &mut S,
    lines: &[RecognizedLine],
    highlighted: &[RecognizedLine],
    page: PageSize,
    style: &OverlayStyle,
) -> RenderOutcome {
    surface.clear();
    let Some(transform) = ViewportTransform::new(page, surface.size()) else {
        return RenderOutcome::Skipped;
    };
    for line in lines {
        surface.stroke_rect(&transform.apply(&line.bbox), &style.base);
    }
    for line in highlighted {
        surface.stroke_rect(&transform.apply(&line.bbox), &style.highlight);
    }
    RenderOutcome::Drawn {
        base: lines.len(),
        highlighted: highlighted.len(),
    }
}

/// Vector surface: an optional page image stretched to the viewport with the
/// boxes layered above it in draw order.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    size: ViewportSize,
    background: Option<String>,
    shapes: Vec<String>,
}

impl SvgSurface {
    pub fn new(size: ViewportSize) -> Self {
        Self {
            size,
            background: None,
            shapes: Vec::new(),
        }
    }

    pub fn with_background(mut self, data_uri: impl Into<String>) -> Self {
        self.background = Some(data_uri.into());
        self
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn to_svg(&self) -> String {
        let ViewportSize {
            width: w,
            height: h,
        } = self.size;
        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        ));
        if let Some(uri) = &self.background {
            let uri = escape_xml(uri);
            svg.push_str(&format!(
                r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#
            ));
        }
        for shape in &self.shapes {
            svg.push_str(shape);
        }
        svg.push_str("</svg>");
        svg
    }
}

impl Surface for SvgSurface {
    fn size(&self) -> ViewportSize {
        self.size
    }

    fn clear(&mut self) {
        self.shapes.clear();
    }

    fn stroke_rect(&mut self, rect: &ViewportRect, style: &BoxStyle) {
        self.shapes.push(format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="none" stroke="{stroke}" stroke-opacity="{opacity}" stroke-width="{width}"/>"#,
            x = rect.x1,
            y = rect.y1,
            w = rect.width(),
            h = rect.height(),
            stroke = escape_xml(&style.color),
            opacity = style.opacity,
            width = style.stroke_width,
        ));
    }
}

pub fn rasterize_svg(svg: &str, output_mime: &str) -> Result<Vec<u8>> {
    let format = image_format_from_mime(output_mime)
        .ok_or_else(|| anyhow!("unsupported output image mime '{}'", output_mime))?;
    let tree = Tree::from_str(svg, &Options::default()).with_context(|| "failed to parse SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    let image = image::RgbaImage::from_raw(size.width(), size.height(), rgba)
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))?;
    let image = match format {
        // JPEG has no alpha channel.
        image::ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(
            image::DynamicImage::ImageRgba8(image).to_rgb8(),
        ),
        _ => image::DynamicImage::ImageRgba8(image),
    };
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .with_context(|| "failed to encode overlay image")?;
    Ok(bytes)
}

fn image_format_from_mime(mime: &str) -> Option<image::ImageFormat> {
    match mime {
        "image/png" => Some(image::ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(image::ImageFormat::Jpeg),
        "image/gif" => Some(image::ImageFormat::Gif),
        "image/webp" => Some(image::ImageFormat::WebP),
        "image/bmp" => Some(image::ImageFormat::Bmp),
        "image/tiff" => Some(image::ImageFormat::Tiff),
        _ => None,
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
