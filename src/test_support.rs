//! Fixtures shared by unit tests: in-memory documents and a mock model endpoint.

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::{json, Value};

use crate::extract::{ExtractionError, OcrBackend};

/// API key the mock model endpoint accepts.
pub const MOCK_API_KEY: &str = "test-key";

/// The three-part sample invoice used across tests.
pub const SAMPLE_INVOICE_TEXT: &str = "INVOICE
Invoice #: INV-2023-001
Date: 2023-01-15
From: ABC Corporation
Web Design Services 1 $1,000.00 $1,000.00
Hosting (Annual) 1 $250.00 $250.00
Subtotal: $1,250.00
Tax (8%): $100.00
Total: $1,350.00";

/// Model reply for prompts mentioning the sample invoice, fenced the way
/// chat models often answer.
pub const SAMPLE_MODEL_REPLY: &str = r#"```json
{
  "invoice_number": "INV-2023-001",
  "vendor_name": "ABC Corporation",
  "date": "2023-01-15",
  "subtotal": 1250.00,
  "tax": 100.00,
  "total": 1350.00,
  "line_items": [
    {"description": "Web Design Services", "quantity": 1, "unit_price": 1000.00, "amount": 1000.00},
    {"description": "Hosting (Annual)", "quantity": 1, "unit_price": 250.00, "amount": 250.00}
  ]
}
```"#;

/// Build a PDF with one page per entry, each line in its own text object.
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let y = 780 - 16 * i as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![50.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Single-page PDF carrying [`SAMPLE_INVOICE_TEXT`].
pub fn sample_invoice_pdf() -> Vec<u8> {
    let lines: Vec<&str> = SAMPLE_INVOICE_TEXT.lines().collect();
    pdf_with_pages(&[&lines])
}

/// Build a DOCX package from raw `w:body` XML.
pub fn docx_with_body(body_xml: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body_xml
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer
        .write_all(
            br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
        )
        .unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Build a DOCX package with one simple paragraph per entry.
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                quick_xml::escape::escape(*p)
            )
        })
        .collect();
    docx_with_body(&body)
}

/// A small valid PNG.
pub fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// How the mock model endpoint answers.
#[derive(Debug, Clone, Copy)]
pub enum MockLlm {
    /// Answer with [`SAMPLE_MODEL_REPLY`] when the prompt mentions the sample invoice.
    Echo,
    /// HTTP 500.
    ServerError,
    /// HTTP 200 carrying an API error object.
    QuotaError,
    /// HTTP 200 with no candidates.
    NoCandidates,
    /// HTTP 200 with one candidate whose text is empty.
    BlankReply,
}

#[derive(Clone)]
struct MockState {
    mode: MockLlm,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// Handle to a running mock model endpoint.
pub struct MockLlmServer {
    pub endpoint: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockLlmServer {
    pub fn last_request(&self) -> Option<Value> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn mock_reply(prompt: &str) -> String {
    if prompt.contains("INV-2023-001") {
        SAMPLE_MODEL_REPLY.to_string()
    } else {
        r#"{"invoice_number": null}"#.to_string()
    }
}

fn header_is(headers: &HeaderMap, name: &str, expected: &str) -> bool {
    headers.get(name).and_then(|v| v.to_str().ok()) == Some(expected)
}

fn canned_response(mode: MockLlm) -> Option<Response> {
    match mode {
        MockLlm::Echo => None,
        MockLlm::ServerError => {
            Some((StatusCode::INTERNAL_SERVER_ERROR, "backend exploded").into_response())
        }
        MockLlm::QuotaError => Some(
            Json(json!({"error": {"code": 429, "message": "Quota exceeded for model"}}))
                .into_response(),
        ),
        MockLlm::NoCandidates => Some(Json(json!({"candidates": [], "choices": []})).into_response()),
        MockLlm::BlankReply => Some(
            Json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": ""}]}}],
                "choices": [{"index": 0, "message": {"role": "assistant", "content": ""}}]
            }))
            .into_response(),
        ),
    }
}

async fn mock_gemini(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !header_is(&headers, "x-goog-api-key", MOCK_API_KEY) {
        return (StatusCode::UNAUTHORIZED, "API key not valid").into_response();
    }
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    state.requests.lock().unwrap().push(body);

    if let Some(resp) = canned_response(state.mode) {
        return resp;
    }
    Json(json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": mock_reply(&prompt)}]}}]
    }))
    .into_response()
}

async fn mock_chat(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !header_is(&headers, "authorization", &format!("Bearer {}", MOCK_API_KEY)) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    let prompt = body["messages"][0]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    state.requests.lock().unwrap().push(body);

    if let Some(resp) = canned_response(state.mode) {
        return resp;
    }
    Json(json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": mock_reply(&prompt)}}]
    }))
    .into_response()
}

/// Start a mock Gemini/OpenAI endpoint on an ephemeral loopback port.
pub async fn spawn_mock_llm(mode: MockLlm) -> MockLlmServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        mode,
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/v1beta/models/:model_action", post(mock_gemini))
        .route("/v1/chat/completions", post(mock_chat))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockLlmServer {
        endpoint: format!("http://{}", addr),
        requests,
    }
}

/// OCR backend that returns fixed text and counts calls.
pub struct StubOcr {
    text: String,
    calls: Arc<AtomicUsize>,
}

impl StubOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter, readable after the stub is boxed.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl OcrBackend for StubOcr {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "stub backend".to_string()
    }

    fn ocr_image(&self, image_path: &Path) -> Result<String, ExtractionError> {
        assert!(image_path.exists(), "OCR input should be staged on disk");
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}
