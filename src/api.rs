//! HTTP surface for Docu-Chat.
//!
//! A compact Axum router over the ingestion pipeline:
//!
//! - `GET /` – Banner confirming the API is running.
//! - `GET /health` – Liveness probe.
//! - `POST /upload` – Multipart upload (field `file`) of a PDF. Optional `chunk_size` and
//!   `overlap` query parameters override the configured window. Returns a fresh `document_id` and
//!   the number of chunks created.
//! - `GET /metrics` – Ingestion counters.
//!
//! Pipeline errors map to status codes here; the pipeline itself knows nothing about HTTP.
//! Error bodies use the shape `{ "detail": "..." }`.

use crate::processing::{ChunkingConfig, IngestApi, IngestError, RawUpload};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Multipart field carrying the uploaded document.
const FILE_FIELD: &str = "file";

/// Build the HTTP router exposing the ingestion API surface.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: IngestApi + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/upload", post(upload_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Hello World! Docu-Chat API is running!" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "message": "API is running successfully" }))
}

/// Optional per-request overrides for the chunking window.
#[derive(Debug, Default, Deserialize)]
struct UploadParams {
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default)]
    overlap: Option<usize>,
}

impl UploadParams {
    /// Merge the overrides with `defaults`; `None` when the request overrides nothing.
    fn overrides(&self, defaults: ChunkingConfig) -> Result<Option<ChunkingConfig>, AppError> {
        if self.chunk_size.is_none() && self.overlap.is_none() {
            return Ok(None);
        }
        let chunk_size = self.chunk_size.unwrap_or(defaults.chunk_size());
        let overlap = self.overlap.unwrap_or(defaults.overlap());
        ChunkingConfig::new(chunk_size, overlap)
            .map(Some)
            .map_err(|error| AppError::bad_request(error.to_string()))
    }
}

/// Success response for the `POST /upload` endpoint.
#[derive(Serialize)]
struct UploadResponse {
    /// Human-readable confirmation.
    message: String,
    /// Identifier minted for this upload.
    document_id: String,
    /// Number of chunks produced for the document.
    chunks_created: usize,
    /// Characters in the normalized document text.
    characters: usize,
    /// Window size used for this upload.
    chunk_size: usize,
    /// Overlap used for this upload.
    overlap: usize,
}

/// Ingest an uploaded PDF and report how many chunks it produced.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    params: Result<Query<UploadParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError>
where
    S: IngestApi,
{
    let Query(params) = params?;
    let defaults = service.default_chunking();
    let overrides = params.overrides(defaults)?;
    let upload = read_upload(&mut multipart?).await?;
    let filename = upload.filename.clone();

    let (result, chunking) = match overrides {
        Some(chunking) => (service.ingest_with(upload, chunking).await?, chunking),
        None => (service.ingest(upload).await?, defaults),
    };
    let document_id = Uuid::new_v4().to_string();
    tracing::info!(
        filename = %filename,
        document_id = %document_id,
        chunks = result.chunk_count(),
        "Upload request completed"
    );

    Ok(Json(UploadResponse {
        message: format!("Successfully processed {filename}"),
        document_id,
        chunks_created: result.chunk_count(),
        characters: result.char_count(),
        chunk_size: chunking.chunk_size(),
        overlap: chunking.overlap(),
    }))
}

/// Pull the `file` field out of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<RawUpload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(RawUpload::new(bytes.to_vec(), filename));
    }
    Err(AppError::bad_request(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}

/// Return the ingestion counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: IngestApi,
{
    Json(service.metrics_snapshot())
}

struct AppError {
    status: StatusCode,
    detail: String,
}

impl AppError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(inner: IngestError) -> Self {
        let status = if inner.is_timeout() {
            StatusCode::REQUEST_TIMEOUT
        } else if inner.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            detail: inner.to_string(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(inner: QueryRejection) -> Self {
        Self {
            status: inner.status(),
            detail: inner.body_text(),
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(inner: MultipartRejection) -> Self {
        Self {
            status: inner.status(),
            detail: inner.body_text(),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self {
            status: inner.status(),
            detail: inner.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::extraction::ExtractionError;
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        Chunk, ChunkingConfig, IngestApi, IngestError, IngestionResult, RawUpload,
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
        response::Response,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "docuchat-test-boundary";

    type Responder = fn(&RawUpload) -> Result<IngestionResult, IngestError>;

    #[derive(Clone, Debug)]
    struct IngestCall {
        filename: String,
        bytes: Vec<u8>,
        chunking: ChunkingConfig,
        overridden: bool,
    }

    struct StubIngestService {
        calls: Mutex<Vec<IngestCall>>,
        respond: Responder,
    }

    impl StubIngestService {
        fn new(respond: Responder) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                respond,
            })
        }

        async fn recorded_calls(&self) -> Vec<IngestCall> {
            self.calls.lock().await.clone()
        }

        async fn record(
            &self,
            upload: RawUpload,
            chunking: ChunkingConfig,
            overridden: bool,
        ) -> Result<IngestionResult, IngestError> {
            let outcome = (self.respond)(&upload);
            self.calls.lock().await.push(IngestCall {
                filename: upload.filename,
                bytes: upload.bytes,
                chunking,
                overridden,
            });
            outcome
        }
    }

    #[async_trait]
    impl IngestApi for StubIngestService {
        async fn ingest(&self, upload: RawUpload) -> Result<IngestionResult, IngestError> {
            self.record(upload, self.default_chunking(), false).await
        }

        async fn ingest_with(
            &self,
            upload: RawUpload,
            chunking: ChunkingConfig,
        ) -> Result<IngestionResult, IngestError> {
            self.record(upload, chunking, true).await
        }

        fn default_chunking(&self) -> ChunkingConfig {
            ChunkingConfig::default()
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_ingested: 4,
                chunks_created: 17,
                rejected_uploads: 1,
            }
        }
    }

    fn three_chunks(_upload: &RawUpload) -> Result<IngestionResult, IngestError> {
        let normalized_text = "x".repeat(1200);
        let chunks = [(0, 500), (450, 500), (900, 300)]
            .into_iter()
            .enumerate()
            .map(|(index, (start_offset, length))| Chunk {
                index,
                text: "x".repeat(length),
                start_offset,
                length,
            })
            .collect();
        Ok(IngestionResult {
            normalized_text,
            chunks,
        })
    }

    fn multipart_request(uri: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    #[tokio::test]
    async fn root_and_health_report_running() {
        let app = create_router(StubIngestService::new(three_chunks), 1024);

        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Hello World! Docu-Chat API is running!");

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn upload_returns_chunk_count_and_document_id() {
        let service = StubIngestService::new(three_chunks);
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request("/upload", "file", "paper.pdf", b"%PDF-1.7 bytes"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["chunks_created"], 3);
        assert_eq!(json["characters"], 1200);
        assert_eq!(json["chunk_size"], 500);
        assert_eq!(json["overlap"], 50);
        let document_id = json["document_id"].as_str().expect("document id");
        assert!(uuid::Uuid::parse_str(document_id).is_ok());

        let calls = service.recorded_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].filename, "paper.pdf");
        assert_eq!(calls[0].bytes, b"%PDF-1.7 bytes");
        assert_eq!(calls[0].chunking, ChunkingConfig::default());
        assert!(!calls[0].overridden);
    }

    #[tokio::test]
    async fn upload_applies_query_overrides() {
        let service = StubIngestService::new(three_chunks);
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request(
                "/upload?chunk_size=200&overlap=20",
                "file",
                "paper.pdf",
                b"%PDF",
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let calls = service.recorded_calls().await;
        assert_eq!(calls[0].chunking, ChunkingConfig::new(200, 20).unwrap());
        assert!(calls[0].overridden);
    }

    #[tokio::test]
    async fn single_override_keeps_the_other_default() {
        let service = StubIngestService::new(three_chunks);
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request("/upload?overlap=10", "file", "paper.pdf", b"%PDF"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["chunk_size"], 500);
        assert_eq!(json["overlap"], 10);
        let calls = service.recorded_calls().await;
        assert_eq!(calls[0].chunking, ChunkingConfig::new(500, 10).unwrap());
        assert!(calls[0].overridden);
    }

    #[tokio::test]
    async fn malformed_query_returns_json_detail() {
        let service = StubIngestService::new(three_chunks);
        let app = create_router(service.clone(), 1024 * 1024);

        for uri in ["/upload?chunk_size=abc", "/upload?chunk_size=-1"] {
            let response = app
                .clone()
                .oneshot(multipart_request(uri, "file", "paper.pdf", b"%PDF"))
                .await
                .expect("router response");

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let json = json_body(response).await;
            let detail = json["detail"].as_str().expect("detail");
            assert!(detail.contains("query string"), "{uri}: {detail}");
        }
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn non_multipart_body_returns_json_detail() {
        let service = StubIngestService::new(three_chunks);
        let app = create_router(service.clone(), 1024 * 1024);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"file": "paper.pdf"}"#))
            .expect("request");
        let response = app.oneshot(request).await.expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(!json["detail"].as_str().expect("detail").is_empty());
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_invalid_overrides_before_ingesting() {
        let service = StubIngestService::new(three_chunks);
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request(
                "/upload?chunk_size=100&overlap=100",
                "file",
                "paper.pdf",
                b"%PDF",
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["detail"].as_str().unwrap().contains("overlap"));
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn upload_requires_file_field() {
        let service = StubIngestService::new(three_chunks);
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request("/upload", "attachment", "paper.pdf", b"%PDF"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_file_type_maps_to_bad_request() {
        let service = StubIngestService::new(|upload| {
            Err(IngestError::InvalidFileType {
                filename: upload.filename.clone(),
            })
        });
        let app = create_router(service, 1024 * 1024);

        let response = app
            .oneshot(multipart_request("/upload", "file", "notes.txt", b"hello"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        let detail = json["detail"].as_str().expect("detail");
        assert!(detail.contains("Only PDF files are allowed"));
        assert!(detail.contains("notes.txt"));
    }

    #[tokio::test]
    async fn extraction_timeout_maps_to_request_timeout() {
        let service = StubIngestService::new(|upload| {
            Err(IngestError::Extraction {
                filename: upload.filename.clone(),
                source: ExtractionError::TimedOut {
                    after: Duration::from_secs(30),
                },
            })
        });
        let app = create_router(service, 1024 * 1024);

        let response = app
            .oneshot(multipart_request("/upload", "file", "huge.pdf", b"%PDF"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn internal_errors_map_to_server_error() {
        let service = StubIngestService::new(|_| {
            Err(IngestError::internal(
                "failed to stage upload",
                std::io::Error::other("no space left on device"),
            ))
        });
        let app = create_router(service, 1024 * 1024);

        let response = app
            .oneshot(multipart_request("/upload", "file", "doc.pdf", b"%PDF"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["detail"].as_str().unwrap().contains("no space left"));
    }

    #[tokio::test]
    async fn metrics_route_returns_snapshot() {
        let app = create_router(StubIngestService::new(three_chunks), 1024);

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["documents_ingested"], 4);
        assert_eq!(json["chunks_created"], 17);
        assert_eq!(json["rejected_uploads"], 1);
    }
}
