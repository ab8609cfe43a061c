mod client;
mod models;

pub use client::{ExtractionResult, ServiceClient};
pub use models::{
    CodeItem, DocumentPayload, ExtractionResponse, ReportRequest, ReportResponse,
    SupportingLocation, UploadResponse,
};
