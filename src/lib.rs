use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

pub mod evidence;
pub mod logging;
pub mod overlay;
pub mod preview;
pub mod service;
pub mod session;
pub mod settings;
#[cfg(test)]
mod test_util;
pub mod viewer;

pub use evidence::{EvidenceRecord, match_evidence};
pub use overlay::{DocRect, PageSize, RecognizedLine, ViewportRect, ViewportSize};
pub use session::{DocumentSession, SessionState};
pub use viewer::{RenderStatus, Viewer, ViewerError, ViewerErrorKind};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: Option<String>,
    pub api_base: Option<String>,
    pub extract: bool,
    pub icd_codes: Vec<String>,
    pub output: Option<String>,
    pub display_width: Option<u32>,
    pub settings_path: Option<String>,
}

pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(base) = config.api_base.as_deref().filter(|b| !b.trim().is_empty()) {
        settings.api_base = base.trim().to_string();
    }
    if let Some(width) = config.display_width.filter(|w| *w > 0) {
        settings.display_width = Some(width);
    }

    let mut viewer = Viewer::from_settings(settings)?;
    let file = config.file.as_deref().map(Path::new);
    let load_status = viewer.load_document(file).await?;

    let mut out = Vec::new();
    let session = viewer.session();
    out.push(format!(
        "doc_id: {}",
        session.document_id.as_deref().unwrap_or("unavailable")
    ));
    if let Some(name) = session.document_name.as_deref() {
        out.push(format!("doc_name: {}", name));
    }
    out.push(format!("lines: {}", session.lines.len()));
    out.push(format!("page: {}x{}", session.page.width, session.page.height));
    out.push(format!("overlay: {}", describe_status(load_status)));

    if config.extract {
        let codes = (!config.icd_codes.is_empty()).then_some(config.icd_codes.as_slice());
        let outcome = viewer.extract_evidence(codes).await?;
        for code in &outcome.codes {
            out.push(format!("code: {} {}", code.icd_code, code.icd_description));
        }
        for matched in &outcome.evidence.matched {
            let bbox = matched.line.bbox;
            out.push(format!(
                "evidence: {} \"{}\" [{}, {}, {}, {}]",
                matched.record.code.as_deref().unwrap_or("-"),
                matched.line.text,
                bbox.x1,
                bbox.y1,
                bbox.x2,
                bbox.y2
            ));
        }
        out.push(format!(
            "unmatched evidence: {}",
            outcome.evidence.unmatched.len()
        ));
        out.push(format!("overlay: {}", describe_status(outcome.render)));
    }

    if let Some(output) = config.output.as_deref() {
        if viewer.frame().is_some() {
            let written = viewer.write_frame(&PathBuf::from(output))?;
            out.push(format!("output: {}", written.display()));
        } else {
            warn!("no overlay was rendered; {} not written", output);
        }
    }

    Ok(out.join("\n"))
}

fn describe_status(status: RenderStatus) -> String {
    match status {
        RenderStatus::Rendered(overlay::RenderOutcome::Drawn { base, highlighted }) => {
            format!("rendered ({} lines, {} highlighted)", base, highlighted)
        }
        RenderStatus::Rendered(overlay::RenderOutcome::Skipped) | RenderStatus::NotReady => {
            "skipped (image not ready)".to_string()
        }
        RenderStatus::NoPreview => "no image preview available".to_string(),
        RenderStatus::Stale => "superseded by a newer document".to_string(),
    }
}
