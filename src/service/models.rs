use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceRecord;
use crate::overlay::{DocRect, RecognizedLine};

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub doc_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentPayload {
    pub doc_id: Option<String>,
    pub doc_name: Option<String>,
    pub chunks: Vec<RecognizedLine>,
    pub page_width: Option<f64>,
    pub page_height: Option<f64>,
    pub image_data_url: Option<String>,
}

impl DocumentPayload {
    /// Preview image, if the service produced one. An empty string counts as
    /// missing.
    pub fn preview_url(&self) -> Option<&str> {
        self.image_data_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CodeItem {
    pub icd_code: String,
    pub icd_description: String,
    pub supporting_sentence: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractionResponse {
    pub doc_id: Option<String>,
    pub icds: Vec<CodeItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest<'a> {
    pub doc_id: &'a str,
    pub icd_codes: Option<&'a [String]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupportingLocation {
    pub sentence: String,
    #[serde(default)]
    pub icd_code: Option<String>,
    #[serde(default)]
    pub icd_description: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub bbox: Option<DocRect>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportResponse {
    #[serde(default)]
    pub doc_id: Option<String>,
    pub locations: Vec<SupportingLocation>,
}

impl ReportResponse {
    pub fn evidence_records(&self) -> Vec<EvidenceRecord> {
        self.locations
            .iter()
            .map(|location| EvidenceRecord {
                source_sentence: location.sentence.clone(),
                code: location.icd_code.clone(),
            })
            .collect()
    }
}
