#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ocr_evidence_viewer::Viewer;
use ocr_evidence_viewer::settings::Settings;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the fake service answers to the next `/upload`.
pub enum UploadReply {
    Document { doc_id: String, payload: Value },
    /// `/doc/{id}` answers 200 with this body verbatim.
    RawDocument { doc_id: String, body: String },
    Fail { status: StatusCode, body: Value },
}

#[derive(Default)]
pub struct MockState {
    hits: AtomicUsize,
    uploads: Mutex<VecDeque<UploadReply>>,
    docs: Mutex<HashMap<String, Value>>,
    raw_docs: Mutex<HashMap<String, String>>,
    extraction: Mutex<Option<Value>>,
    report: Mutex<Option<Value>>,
    report_requests: Mutex<Vec<Value>>,
}

impl MockState {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn push_document(&self, doc_id: &str, payload: Value) {
        self.uploads.lock().unwrap().push_back(UploadReply::Document {
            doc_id: doc_id.to_string(),
            payload,
        });
    }

    pub fn push_raw_document(&self, doc_id: &str, body: &str) {
        self.uploads.lock().unwrap().push_back(UploadReply::RawDocument {
            doc_id: doc_id.to_string(),
            body: body.to_string(),
        });
    }

    pub fn push_upload_failure(&self, status: StatusCode, body: Value) {
        self.uploads
            .lock()
            .unwrap()
            .push_back(UploadReply::Fail { status, body });
    }

    pub fn set_extraction(&self, value: Value) {
        *self.extraction.lock().unwrap() = Some(value);
    }

    pub fn set_report(&self, value: Value) {
        *self.report.lock().unwrap() = Some(value);
    }

    pub fn report_requests(&self) -> Vec<Value> {
        self.report_requests.lock().unwrap().clone()
    }
}

pub struct MockService {
    pub base_url: String,
    pub state: Arc<MockState>,
}

pub async fn spawn_service() -> MockService {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/upload", post(upload))
        .route("/doc/:doc_id", get(document))
        .route("/extract-icd", post(extract))
        .route("/view-report", post(view_report))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock service");
    let addr = listener.local_addr().expect("mock address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock service");
    });
    MockService {
        base_url: format!("http://{}", addr),
        state,
    }
}

async fn upload(State(state): State<Arc<MockState>>, _body: Bytes) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let reply = state.uploads.lock().unwrap().pop_front();
    match reply {
        Some(UploadReply::Document { doc_id, payload }) => {
            state.docs.lock().unwrap().insert(doc_id.clone(), payload);
            (
                StatusCode::OK,
                Json(json!({ "status": "ok", "doc_id": doc_id })),
            )
        }
        Some(UploadReply::RawDocument { doc_id, body }) => {
            state.raw_docs.lock().unwrap().insert(doc_id.clone(), body);
            (
                StatusCode::OK,
                Json(json!({ "status": "ok", "doc_id": doc_id })),
            )
        }
        Some(UploadReply::Fail { status, body }) => (status, Json(body)),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "no upload scripted" })),
        ),
    }
}

async fn document(State(state): State<Arc<MockState>>, Path(doc_id): Path<String>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(body) = state.raw_docs.lock().unwrap().get(&doc_id) {
        return (StatusCode::OK, body.clone()).into_response();
    }
    match state.docs.lock().unwrap().get(&doc_id) {
        Some(payload) => Json(payload.clone()).into_response(),
        None => Json(json!({ "error": "doc not found" })).into_response(),
    }
}

async fn extract(State(state): State<Arc<MockState>>, Json(_body): Json<Value>) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    Json(
        state
            .extraction
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| json!({ "icds": [] })),
    )
}

async fn view_report(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.report_requests.lock().unwrap().push(body);
    match state.report.lock().unwrap().clone() {
        Some(report) => (StatusCode::OK, Json(report)),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Unknown doc_id" })),
        ),
    }
}

pub fn png_data_url(width: u32, height: u32) -> String {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    format!("data:image/png;base64,{}", BASE64.encode(bytes))
}

pub fn viewer_for(service: &MockService, display_width: Option<u32>) -> Viewer {
    let settings = Settings {
        api_base: service.base_url.clone(),
        timeout_secs: 10,
        display_width,
        ..Settings::default()
    };
    Viewer::from_settings(settings).expect("viewer")
}

/// A file to hand to `/upload`; the mock ignores its content.
pub fn scan_file(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n").expect("write scan");
    path
}

pub fn count_rects(svg: &str, stroke: &str) -> usize {
    svg.matches(&format!(r#"stroke="{}""#, stroke)).count()
}
