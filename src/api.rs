//! HTTP surface for the summary gateway.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /` – Liveness check returning `{status, message, started_at}`.
//! - `POST /summary` (alias `/summarize`) – Summarize text supplied as JSON `{text}`, a URL-encoded
//!   form, or a multipart form carrying either a `text` field or a PDF file field (`file` /
//!   `pdfFile`). Returns `{summary}`.
//! - `POST /audio-summary` – Turn `{summaryText}` into speech. Returns `{audioData, mimeType}`.
//! - `POST /quiz` – Build a five-question quiz from `{summaryText}`. Returns `{quiz}`.
//! - `GET /metrics` – Observe request counters.
//! - `GET /commands` – Machine-readable command catalog.
//!
//! Every failure is converted into a JSON body `{error, kind, detail?}`; vendor failures map to
//! 500 with the vendor's message in `detail`.

use crate::extraction::{ExtractionError, MAX_DOCUMENT_BYTES};
use crate::logging;
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    GatewayApi, GatewayError, QuizQuestion, UploadedDocument, ValidationError,
};
use crate::speech::AudioResult;
use axum::{
    Form, Json, Router,
    extract::{
        DefaultBodyLimit, FromRequest, Multipart, Request, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
    },
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::Instrument;

/// Request bodies above this size are refused before reaching a handler.
pub const MAX_REQUEST_BYTES: usize = MAX_DOCUMENT_BYTES + 1024 * 1024;

const FILE_FIELDS: [&str; 3] = ["file", "pdfFile", "document"];

/// Build the HTTP router exposing the gateway API surface.
///
/// `allowed_origins` restricts CORS to the listed origins; an empty slice allows any origin.
pub fn create_router<S>(service: Arc<S>, allowed_origins: &[String]) -> Router
where
    S: GatewayApi + 'static,
{
    let started_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Router::new()
        .route("/", get(move || root_status(started_at.clone())))
        .route("/summary", post(summarize::<S>))
        .route("/summarize", post(summarize::<S>))
        .route("/audio-summary", post(audio_summary::<S>))
        .route("/quiz", post(quiz::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(middleware::from_fn(trace_request))
        .layer(cors_layer(allowed_origins))
        .with_state(service)
}

/// CORS policy for browser front ends.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn trace_request(request: Request, next: Next) -> Response {
    let span = logging::request_span(request.method().as_str(), request.uri().path());
    async move {
        let response = next.run(request).await;
        tracing::info!(status = %response.status(), "Request completed");
        response
    }
    .instrument(span)
    .await
}

/// Response body for `GET /`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
    started_at: String,
}

async fn root_status(started_at: String) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: "Summary gateway running",
        started_at,
    })
}

/// Text body accepted by `/summary` as JSON or URL-encoded form.
#[derive(Deserialize)]
struct TextBody {
    #[serde(default)]
    text: Option<String>,
}

/// Success response for the summary endpoints.
#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

/// Input discriminated from the request body.
#[derive(Debug)]
enum SummaryInput {
    Text(String),
    Document(UploadedDocument),
}

/// Summarize text or an uploaded PDF.
///
/// The body format is chosen by `Content-Type`: multipart forms may carry a `text` field or a
/// file field, URL-encoded forms and JSON carry `text`. Exactly one input must be present.
async fn summarize<S>(
    State(service): State<Arc<S>>,
    request: Request,
) -> Result<Json<SummaryResponse>, ApiError>
where
    S: GatewayApi,
{
    let result = match read_summary_input(request).await? {
        SummaryInput::Text(text) => service.summarize_text(text).await?,
        SummaryInput::Document(document) => service.summarize_document(document).await?,
    };
    Ok(Json(SummaryResponse {
        summary: result.summary_text,
    }))
}

async fn read_summary_input(request: Request) -> Result<SummaryInput, GatewayError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|rejection: MultipartRejection| {
                body_rejection(rejection.status(), rejection.body_text())
            })?;
        return read_multipart(multipart).await;
    }

    let body = if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(body) = Form::<TextBody>::from_request(request, &())
            .await
            .map_err(|rejection: FormRejection| {
                body_rejection(rejection.status(), rejection.body_text())
            })?;
        body
    } else {
        let Json(body) = Json::<TextBody>::from_request(request, &())
            .await
            .map_err(|rejection: JsonRejection| {
                body_rejection(rejection.status(), rejection.body_text())
            })?;
        body
    };

    body.text
        .map(SummaryInput::Text)
        .ok_or_else(|| ValidationError::MissingInput.into())
}

async fn read_multipart(mut multipart: Multipart) -> Result<SummaryInput, GatewayError> {
    let mut text: Option<String> = None;
    let mut document: Option<UploadedDocument> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => text = Some(field.text().await.map_err(multipart_error)?),
            Some(file_field) if FILE_FIELDS.contains(&file_field) => {
                let declared_mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers submit an empty part when no file was chosen.
                if !bytes.is_empty() {
                    document = Some(UploadedDocument {
                        bytes: bytes.to_vec(),
                        declared_mime_type,
                        file_name,
                    });
                }
            }
            other => tracing::debug!(field = ?other, "Ignoring unknown multipart field"),
        }
    }

    let has_text = text.as_deref().is_some_and(|value| !value.trim().is_empty());
    match (text, document) {
        (Some(_), Some(_)) if has_text => Err(ValidationError::AmbiguousInput.into()),
        (_, Some(document)) => Ok(SummaryInput::Document(document)),
        (Some(text), None) => Ok(SummaryInput::Text(text)),
        (None, None) => Err(ValidationError::MissingInput.into()),
    }
}

fn multipart_error(error: MultipartError) -> GatewayError {
    body_rejection(error.status(), error.body_text())
}

/// Map an extractor rejection onto the validation taxonomy, keeping size-limit breaches distinct.
fn body_rejection(status: StatusCode, body_text: String) -> GatewayError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::BodyTooLarge {
            limit: MAX_REQUEST_BYTES,
        }
        .into()
    } else {
        ValidationError::InvalidBody(body_text).into()
    }
}

/// Request body for `/audio-summary` and `/quiz`.
#[derive(Deserialize)]
struct SummaryTextRequest {
    #[serde(rename = "summaryText", default)]
    summary_text: String,
}

fn summary_text(
    payload: Result<Json<SummaryTextRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    payload
        .map(|Json(body)| body.summary_text)
        .map_err(|rejection| body_rejection(rejection.status(), rejection.body_text()).into())
}

/// Synthesize speech for a summary.
async fn audio_summary<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<SummaryTextRequest>, JsonRejection>,
) -> Result<Json<AudioResult>, ApiError>
where
    S: GatewayApi,
{
    let text = summary_text(payload)?;
    let audio = service.synthesize_audio(text).await?;
    Ok(Json(audio))
}

/// Response body for `/quiz`.
#[derive(Serialize)]
struct QuizResponse {
    quiz: Vec<QuizQuestion>,
}

/// Generate a multiple-choice quiz for a summary.
async fn quiz<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<SummaryTextRequest>, JsonRejection>,
) -> Result<Json<QuizResponse>, ApiError>
where
    S: GatewayApi,
{
    let text = summary_text(payload)?;
    let quiz = service.generate_quiz(text).await?;
    Ok(Json(QuizResponse { quiz }))
}

/// Return a snapshot of the gateway counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: GatewayApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by clients.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summary",
                method: "POST",
                path: "/summary",
                description: "Summarize text (JSON or form field `text`) or an uploaded PDF (multipart field `file`). Response returns { \"summary\": string }.",
                request_example: Some(json!({ "text": "Long article to summarize" })),
            },
            CommandDescriptor {
                name: "audio_summary",
                method: "POST",
                path: "/audio-summary",
                description: "Synthesize speech for a summary. Response returns { \"audioData\": base64, \"mimeType\": string }.",
                request_example: Some(json!({ "summaryText": "Short summary" })),
            },
            CommandDescriptor {
                name: "quiz",
                method: "POST",
                path: "/quiz",
                description: "Generate five multiple-choice questions from a summary.",
                request_example: Some(json!({ "summaryText": "Short summary" })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return request counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

/// Structured error body returned for every failure.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

struct ApiError(GatewayError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            GatewayError::Validation(ValidationError::BodyTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Extraction(error) => match error {
                ExtractionError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ExtractionError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                ExtractionError::Unreadable(_) | ExtractionError::EmptyDocument => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            GatewayError::Upstream(_) | GatewayError::Speech(_) | GatewayError::Quiz(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();
        let body = if status.is_server_error() {
            let error = match &self.0 {
                GatewayError::Speech(_) => "Error generating audio",
                GatewayError::Quiz(_) => "Error generating quiz",
                _ => "Error generating summary",
            };
            ErrorBody {
                error: error.to_string(),
                kind,
                detail: Some(self.0.to_string()),
            }
        } else {
            tracing::info!(%status, kind, error = %self.0, "Request rejected");
            ErrorBody {
                error: self.0.to_string(),
                kind,
                detail: None,
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(inner: GatewayError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_REQUEST_BYTES, create_router, get_commands};
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{GatewayApi, GatewayError, QuizQuestion, UploadedDocument};
    use crate::speech::{AudioResult, TtsError};
    use crate::summarization::{SummarizeResult, UpstreamError};
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use reqwest::StatusCode as VendorStatus;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Text(String),
        Document {
            mime: String,
            file_name: Option<String>,
            len: usize,
        },
        Audio(String),
        Quiz(String),
    }

    #[derive(Default)]
    struct StubGateway {
        calls: Mutex<Vec<Call>>,
        fail_upstream: bool,
    }

    impl StubGateway {
        fn failing() -> Self {
            Self {
                fail_upstream: true,
                ..Self::default()
            }
        }

        async fn recorded_calls(&self) -> Vec<Call> {
            self.calls.lock().await.clone()
        }

        fn upstream_error() -> GatewayError {
            UpstreamError::Http {
                status: VendorStatus::UNAUTHORIZED,
                message: "invalid api token".into(),
            }
            .into()
        }
    }

    #[async_trait]
    impl GatewayApi for StubGateway {
        async fn summarize_text(&self, text: String) -> Result<SummarizeResult, GatewayError> {
            self.calls.lock().await.push(Call::Text(text.clone()));
            if self.fail_upstream {
                return Err(Self::upstream_error());
            }
            if text.trim().is_empty() {
                return Err(crate::processing::ValidationError::EmptyText.into());
            }
            Ok(SummarizeResult {
                summary_text: "Resumen".into(),
            })
        }

        async fn summarize_document(
            &self,
            document: UploadedDocument,
        ) -> Result<SummarizeResult, GatewayError> {
            self.calls.lock().await.push(Call::Document {
                mime: document.declared_mime_type,
                file_name: document.file_name,
                len: document.bytes.len(),
            });
            Ok(SummarizeResult {
                summary_text: "Resumen del PDF".into(),
            })
        }

        async fn synthesize_audio(
            &self,
            summary_text: String,
        ) -> Result<AudioResult, GatewayError> {
            self.calls.lock().await.push(Call::Audio(summary_text));
            if self.fail_upstream {
                return Err(TtsError::NoAudio.into());
            }
            Ok(AudioResult {
                audio_data: "AAEC".into(),
                mime_type: "audio/wav".into(),
            })
        }

        async fn generate_quiz(
            &self,
            summary_text: String,
        ) -> Result<Vec<QuizQuestion>, GatewayError> {
            self.calls.lock().await.push(Call::Quiz(summary_text));
            Ok(vec![QuizQuestion {
                question: "¿Qué?".into(),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                answer: "A".into(),
            }])
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                summaries_generated: 3,
                ..MetricsSnapshot::default()
            }
        }
    }

    async fn send(
        service: Arc<StubGateway>,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let response = create_router(service, &[])
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn post_json(value: Value) -> (Option<&'static str>, Body) {
        (Some("application/json"), Body::from(value.to_string()))
    }

    const BOUNDARY: &str = "gateway-test-boundary";

    fn multipart_body(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Body {
        let mut body = Vec::new();
        for (name, file, contents) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((file_name, content_type)) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                }
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(contents);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn multipart_content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    #[tokio::test]
    async fn commands_catalog_exposes_summary_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let summary = commands
            .iter()
            .find(|cmd| cmd.name == "summary")
            .expect("summary command present");

        assert_eq!(summary.method, "POST");
        assert_eq!(summary.path, "/summary");
        assert!(commands.iter().any(|cmd| cmd.path == "/audio-summary"));
    }

    #[tokio::test]
    async fn root_reports_ok() {
        let service = Arc::new(StubGateway::default());
        let (status, body) = send(service, Method::GET, "/", None, Body::empty()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn json_text_is_summarized_on_both_paths() {
        for path in ["/summary", "/summarize"] {
            let service = Arc::new(StubGateway::default());
            let (content_type, body) = post_json(json!({ "text": "Texto largo" }));
            let (status, json) = send(service.clone(), Method::POST, path, content_type, body).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(json, json!({ "summary": "Resumen" }));
            assert_eq!(service.recorded_calls().await, vec![Call::Text("Texto largo".into())]);
        }
    }

    #[tokio::test]
    async fn missing_text_is_client_error() {
        let service = Arc::new(StubGateway::default());
        let (content_type, body) = post_json(json!({}));
        let (status, json) = send(service.clone(), Method::POST, "/summary", content_type, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "missing_input");
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_client_error() {
        let service = Arc::new(StubGateway::default());
        let (status, json) = send(
            service.clone(),
            Method::POST,
            "/summary",
            Some("application/json"),
            Body::from("{not json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "invalid_body");
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn form_encoded_text_is_accepted() {
        let service = Arc::new(StubGateway::default());
        let (status, json) = send(
            service.clone(),
            Method::POST,
            "/summarize",
            Some("application/x-www-form-urlencoded"),
            Body::from("text=Hola+mundo"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["summary"], "Resumen");
        assert_eq!(service.recorded_calls().await, vec![Call::Text("Hola mundo".into())]);
    }

    #[tokio::test]
    async fn multipart_pdf_is_forwarded_as_document() {
        let service = Arc::new(StubGateway::default());
        let body = multipart_body(&[(
            "pdfFile",
            Some(("notes.pdf", "application/pdf")),
            b"%PDF-1.7 fake",
        )]);
        let content_type = multipart_content_type();
        let (status, json) =
            send(service.clone(), Method::POST, "/summary", Some(&content_type), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["summary"], "Resumen del PDF");
        assert_eq!(
            service.recorded_calls().await,
            vec![Call::Document {
                mime: "application/pdf".into(),
                file_name: Some("notes.pdf".into()),
                len: 13,
            }]
        );
    }

    #[tokio::test]
    async fn multipart_with_text_and_file_is_ambiguous() {
        let service = Arc::new(StubGateway::default());
        let body = multipart_body(&[
            ("text", None, b"Hola"),
            ("file", Some(("notes.pdf", "application/pdf")), b"%PDF-1.7"),
        ]);
        let content_type = multipart_content_type();
        let (status, json) =
            send(service.clone(), Method::POST, "/summary", Some(&content_type), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "ambiguous_input");
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn multipart_without_inputs_is_missing() {
        let service = Arc::new(StubGateway::default());
        let body = multipart_body(&[("file", Some(("", "application/octet-stream")), b"")]);
        let content_type = multipart_content_type();
        let (status, json) =
            send(service.clone(), Method::POST, "/summary", Some(&content_type), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "missing_input");
    }

    #[tokio::test]
    async fn upstream_failure_surfaces_detail() {
        let service = Arc::new(StubGateway::failing());
        let (content_type, body) = post_json(json!({ "text": "Texto" }));
        let (status, json) = send(service, Method::POST, "/summary", content_type, body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["kind"], "upstream_http_error");
        let detail = json["detail"].as_str().expect("detail");
        assert!(detail.contains("invalid api token"));
        assert!(detail.contains("401"));
    }

    #[tokio::test]
    async fn audio_summary_returns_camel_case_payload() {
        let service = Arc::new(StubGateway::default());
        let (content_type, body) = post_json(json!({ "summaryText": "Resumen" }));
        let (status, json) =
            send(service.clone(), Method::POST, "/audio-summary", content_type, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "audioData": "AAEC", "mimeType": "audio/wav" }));
        assert_eq!(service.recorded_calls().await, vec![Call::Audio("Resumen".into())]);
    }

    #[tokio::test]
    async fn audio_failure_is_server_error() {
        let service = Arc::new(StubGateway::failing());
        let (content_type, body) = post_json(json!({ "summaryText": "Resumen" }));
        let (status, json) = send(service, Method::POST, "/audio-summary", content_type, body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["kind"], "tts_no_audio");
        assert_eq!(json["detail"], "no audio returned");
    }

    #[tokio::test]
    async fn quiz_returns_questions() {
        let service = Arc::new(StubGateway::default());
        let (content_type, body) = post_json(json!({ "summaryText": "Resumen" }));
        let (status, json) = send(service, Method::POST, "/quiz", content_type, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["quiz"][0]["options"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn metrics_snapshot_is_exposed() {
        let service = Arc::new(StubGateway::default());
        let (status, json) = send(service, Method::GET, "/metrics", None, Body::empty()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["summaries_generated"], 3);
        assert_eq!(json["upstream_failures"], 0);
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/summary")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn preflight_allows_any_origin_by_default() {
        let router = create_router(Arc::new(StubGateway::default()), &[]);
        let response = router
            .oneshot(preflight("http://localhost:5173"))
            .await
            .expect("router response");

        assert!(response.status().is_success());
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );
    }

    #[tokio::test]
    async fn preflight_respects_configured_origins() {
        let origins = vec!["https://app.example".to_string()];
        let router = create_router(Arc::new(StubGateway::default()), &origins);

        let allowed = router
            .clone()
            .oneshot(preflight("https://app.example"))
            .await
            .expect("router response");
        assert_eq!(
            allowed
                .headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("https://app.example")
        );

        let denied = router
            .oneshot(preflight("https://evil.example"))
            .await
            .expect("router response");
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn simple_request_carries_cors_header() {
        let router = create_router(Arc::new(StubGateway::default()), &[]);
        let request = Request::builder()
            .uri("/")
            .header("origin", "http://localhost:5173")
            .body(Body::empty())
            .expect("request");
        let response = router.oneshot(request).await.expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn oversized_json_body_is_payload_too_large() {
        let service = Arc::new(StubGateway::default());
        let text = "a".repeat(MAX_REQUEST_BYTES);
        let (content_type, body) = post_json(json!({ "text": text }));
        let (status, json) = send(service.clone(), Method::POST, "/summary", content_type, body).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["kind"], "payload_too_large");
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_reports_limit() {
        let service = Arc::new(StubGateway::default());
        let contents = vec![b'x'; MAX_REQUEST_BYTES + 1];
        let body = multipart_body(&[("file", Some(("big.pdf", "application/pdf")), contents.as_slice())]);
        let content_type = multipart_content_type();
        let (status, json) =
            send(service.clone(), Method::POST, "/summary", Some(&content_type), body).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["kind"], "payload_too_large");
        assert_eq!(
            json["error"],
            format!("request body exceeds the {MAX_REQUEST_BYTES} byte limit")
        );
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn oversized_quiz_body_is_payload_too_large() {
        let service = Arc::new(StubGateway::default());
        let (content_type, body) = post_json(json!({ "summaryText": "b".repeat(MAX_REQUEST_BYTES) }));
        let (status, json) = send(service, Method::POST, "/quiz", content_type, body).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["kind"], "payload_too_large");
    }
}
