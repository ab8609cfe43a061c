use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::evidence::{EvidenceReport, match_report};
use crate::overlay::{
    PageSize, RecognizedLine, RenderOutcome, SvgSurface, ViewportSize, rasterize_svg, render_boxes,
};
use crate::preview::{PreviewReady, decode_preview};
use crate::service::{CodeItem, ServiceClient};
use crate::session::{DocumentSession, SessionState};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerErrorKind {
    /// Nothing to act on yet: no file chosen, or no document loaded.
    InputMissing,
    /// The document service failed or answered with an error payload.
    Collaborator,
    Render,
}

#[derive(Debug)]
pub struct ViewerError {
    pub kind: ViewerErrorKind,
    pub message: String,
}

impl ViewerError {
    fn input_missing(message: impl Into<String>) -> Self {
        Self {
            kind: ViewerErrorKind::InputMissing,
            message: message.into(),
        }
    }

    fn collaborator(err: anyhow::Error) -> Self {
        Self {
            kind: ViewerErrorKind::Collaborator,
            message: format!("{:#}", err),
        }
    }

    fn render(err: anyhow::Error) -> Self {
        Self {
            kind: ViewerErrorKind::Render,
            message: format!("{:#}", err),
        }
    }
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ViewerError {}

/// What happened to the overlay after a load or extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Rendered(RenderOutcome),
    /// The page image has no intrinsic size yet; nothing was drawn.
    NotReady,
    /// The document has no usable page image.
    NoPreview,
    /// A newer document was loaded before this one's image finished decoding.
    Stale,
}

/// The last drawn overlay.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub document_id: String,
    pub viewport: ViewportSize,
    pub outcome: RenderOutcome,
    pub svg: String,
}

/// A load whose session is in place but whose page image may still be
/// decoding. Pass it to [`Viewer::finish_load`].
pub struct LoadTicket {
    document_id: String,
    preview: Option<JoinHandle<anyhow::Result<PreviewReady>>>,
}

impl LoadTicket {
    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub document_id: String,
    pub codes: Vec<CodeItem>,
    pub evidence: EvidenceReport,
    pub render: RenderStatus,
}

pub struct Viewer {
    settings: Settings,
    client: ServiceClient,
    session: SessionState,
    preview: Option<PreviewReady>,
    highlighted: Vec<RecognizedLine>,
    frame: Option<RenderedFrame>,
}

impl Viewer {
    pub fn new(settings: Settings, client: ServiceClient) -> Self {
        Self {
            settings,
            client,
            session: SessionState::new(),
            preview: None,
            highlighted: Vec::new(),
            frame: None,
        }
    }

    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let client = ServiceClient::new(
            settings.api_base.clone(),
            Duration::from_secs(settings.timeout_secs),
        )?;
        Ok(Self::new(settings, client))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> Arc<DocumentSession> {
        self.session.current()
    }

    pub fn frame(&self) -> Option<&RenderedFrame> {
        self.frame.as_ref()
    }

    pub fn highlighted(&self) -> &[RecognizedLine] {
        &self.highlighted
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.preview = None;
        self.highlighted.clear();
        self.frame = None;
    }

    pub async fn load_document(
        &mut self,
        path: Option<&Path>,
    ) -> Result<RenderStatus, ViewerError> {
        let ticket = self.begin_load(path).await?;
        Ok(self.finish_load(ticket).await)
    }

    /// Uploads the file, fetches its OCR lines and replaces the session. The
    /// page image decode starts in the background.
    pub async fn begin_load(&mut self, path: Option<&Path>) -> Result<LoadTicket, ViewerError> {
        let path = path.ok_or_else(|| ViewerError::input_missing("choose a file first"))?;
        info!("viewer: uploading and running OCR for {}", path.display());

        let upload = self
            .client
            .upload(path)
            .await
            .map_err(ViewerError::collaborator)?;
        info!("viewer: upload ok, doc_id = {}", upload.doc_id);

        let payload = self
            .client
            .fetch_document(&upload.doc_id)
            .await
            .map_err(ViewerError::collaborator)?;

        let page = PageSize::from_reported(
            payload.page_width,
            payload.page_height,
            self.settings.default_page,
        );
        let preview_url = payload.preview_url().map(str::to_string);
        info!(
            "viewer: loaded {} lines, page {}x{}",
            payload.chunks.len(),
            page.width,
            page.height
        );
        self.session.load(
            upload.doc_id.clone(),
            payload.doc_name,
            payload.chunks,
            page,
        );
        self.preview = None;
        self.highlighted.clear();
        self.frame = None;

        let preview = match preview_url {
            Some(url) => Some(tokio::spawn(decode_preview(upload.doc_id.clone(), url))),
            None => {
                warn!("viewer: no image preview available for {}", upload.doc_id);
                None
            }
        };
        Ok(LoadTicket {
            document_id: upload.doc_id,
            preview,
        })
    }

    /// Waits for the page image and draws every line, unless a newer document
    /// has replaced this one in the meantime.
    pub async fn finish_load(&mut self, ticket: LoadTicket) -> RenderStatus {
        let Some(handle) = ticket.preview else {
            return RenderStatus::NoPreview;
        };
        let ready = match handle.await {
            Ok(Ok(ready)) => ready,
            Ok(Err(err)) => {
                warn!("viewer: preview for {} unavailable: {:#}", ticket.document_id, err);
                return self.current_status_or(&ticket.document_id, RenderStatus::NoPreview);
            }
            Err(err) => {
                warn!("viewer: preview task for {} failed: {}", ticket.document_id, err);
                return self.current_status_or(&ticket.document_id, RenderStatus::NoPreview);
            }
        };
        if !self.session.is_current(&ready.document_id) {
            debug!("viewer: dropping stale render for {}", ready.document_id);
            return RenderStatus::Stale;
        }
        self.preview = Some(ready);
        self.render_current()
    }

    fn current_status_or(&self, document_id: &str, status: RenderStatus) -> RenderStatus {
        if self.session.is_current(document_id) {
            status
        } else {
            RenderStatus::Stale
        }
    }

    /// Runs code extraction for the loaded document, resolves the cited
    /// sentences to OCR lines and redraws with those lines highlighted.
    pub async fn extract_evidence(
        &mut self,
        codes: Option<&[String]>,
    ) -> Result<ExtractionOutcome, ViewerError> {
        let session = self.session.current();
        let document_id = session
            .document_id
            .clone()
            .ok_or_else(|| ViewerError::input_missing("upload a document first"))?;

        info!("viewer: calling /extract-icd for {}", document_id);
        let extraction = self
            .client
            .extract_codes(&document_id)
            .await
            .map_err(ViewerError::collaborator)?;
        info!(
            "viewer: extraction result: {}",
            serde_json::to_string_pretty(&extraction.raw).unwrap_or_default()
        );

        info!("viewer: calling /view-report for grounded locations");
        let report = self
            .client
            .view_report(&document_id, codes)
            .await
            .map_err(ViewerError::collaborator)?;
        info!("viewer: report has {} locations", report.locations.len());

        let evidence = match_report(&report.evidence_records(), &session.lines);
        for record in &evidence.unmatched {
            debug!(
                "viewer: no OCR line matches evidence sentence {:?}",
                record.source_sentence
            );
        }
        info!(
            "viewer: {} of {} evidence sentences matched",
            evidence.matched.len(),
            evidence.matched.len() + evidence.unmatched.len()
        );
        self.highlighted = evidence.highlighted();
        let render = self.render_current();

        Ok(ExtractionOutcome {
            document_id,
            codes: extraction.parsed.icds,
            evidence,
            render,
        })
    }

    /// Full redraw from the session as it is now.
    fn render_current(&mut self) -> RenderStatus {
        let session = self.session.current();
        let Some(document_id) = session.document_id.as_deref() else {
            return RenderStatus::NoPreview;
        };
        let Some(preview) = self
            .preview
            .as_ref()
            .filter(|preview| preview.document_id == document_id)
        else {
            return RenderStatus::NoPreview;
        };
        let Some(viewport) = preview.displayed_size(self.settings.display_width) else {
            debug!("viewer: page image for {} has no size yet", document_id);
            return RenderStatus::NotReady;
        };

        let mut surface = SvgSurface::new(viewport).with_background(preview.data_url.clone());
        let outcome = render_boxes(
            &mut surface,
            &session.lines,
            &self.highlighted,
            session.page,
            &self.settings.overlay,
        );
        if outcome == RenderOutcome::Skipped {
            return RenderStatus::NotReady;
        }
        self.frame = Some(RenderedFrame {
            document_id: document_id.to_string(),
            viewport,
            outcome,
            svg: surface.to_svg(),
        });
        RenderStatus::Rendered(outcome)
    }

    /// Rasterizes the last frame to `path`; the format follows the extension.
    pub fn write_frame(&self, path: &Path) -> Result<PathBuf, ViewerError> {
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| ViewerError::input_missing("nothing has been rendered"))?;
        let mime = output_mime_for(path);
        let bytes = rasterize_svg(&frame.svg, mime).map_err(ViewerError::render)?;
        std::fs::write(path, bytes)
            .with_context(|| format!("failed to write overlay image: {}", path.display()))
            .map_err(ViewerError::render)?;
        info!("viewer: wrote overlay {}", path.display());
        Ok(path.to_path_buf())
    }
}

fn output_mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "image/png",
    }
}
