use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

use crate::overlay::ViewportSize;

/// A parsed `data:` URI carrying an encoded page image.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(value: &str) -> Result<Self> {
        let rest = value
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| anyhow!("image url is not a data url"))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| anyhow!("data url has no payload separator"))?;
        let mut parts = meta.split(';');
        let mime = parts
            .next()
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "text/plain".to_string());
        let is_base64 = parts.any(|part| part.trim().eq_ignore_ascii_case("base64"));
        let bytes = if is_base64 {
            BASE64
                .decode(payload.trim())
                .with_context(|| "failed to decode base64 data url payload")?
        } else {
            payload.as_bytes().to_vec()
        };
        Ok(Self { mime, bytes })
    }
}

/// Page image after decoding finished, tagged with the document it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReady {
    pub document_id: String,
    pub data_url: String,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl PreviewReady {
    /// On-screen size of the image: `display_width` wide with the height
    /// following the aspect ratio, or the natural size when no width is set.
    /// `None` while the image has no intrinsic size.
    pub fn displayed_size(&self, display_width: Option<u32>) -> Option<ViewportSize> {
        if self.natural_width == 0 || self.natural_height == 0 {
            return None;
        }
        let natural_w = self.natural_width as f64;
        let natural_h = self.natural_height as f64;
        match display_width.filter(|w| *w > 0) {
            Some(width) => {
                let width = width as f64;
                let height = (width * natural_h / natural_w).round().max(1.0);
                Some(ViewportSize::new(width, height))
            }
            None => Some(ViewportSize::new(natural_w, natural_h)),
        }
    }
}

/// Decodes the page image off the async runtime and resolves once the image
/// is ready to be drawn.
pub async fn decode_preview(document_id: String, data_url: String) -> Result<PreviewReady> {
    tokio::task::spawn_blocking(move || decode_preview_blocking(document_id, data_url))
        .await
        .with_context(|| "preview decode task failed")?
}

fn decode_preview_blocking(document_id: String, data_url: String) -> Result<PreviewReady> {
    let parsed = DataUrl::parse(&data_url)?;
    if !parsed.mime.starts_with("image/") {
        return Err(anyhow!("data url is not an image (mime={})", parsed.mime));
    }
    let image = image::load_from_memory(&parsed.bytes)
        .with_context(|| format!("failed to decode preview image ({})", parsed.mime))?;
    debug!(
        "preview: decoded {}x{} {} for {}",
        image.width(),
        image.height(),
        parsed.mime,
        document_id
    );
    Ok(PreviewReady {
        document_id,
        data_url,
        natural_width: image.width(),
        natural_height: image.height(),
    })
}
