use crate::config::Config;
use crate::engine::{OcrEngine, Progress};
use crate::engines::{EngineInfo, EngineRegistry};
use crate::error::OcrError;
use crate::preprocessing::{EnhanceOptions, Pipeline, PreprocessResult};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EngineRegistry>,
    pub config: Arc<Config>,
    /// Single-permit gate: at most one extraction runs at a time
    pub busy: Arc<Semaphore>,
}

impl AppState {
    pub fn new(registry: EngineRegistry, config: Config) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
            busy: Arc::new(Semaphore::new(1)),
        }
    }
}

/// Extraction response
#[derive(Serialize)]
pub struct ExtractResponse {
    pub text: String,
    pub engine: String,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
    pub preprocessing: PreprocessResult,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub default_engine: String,
    pub available_engines: Vec<EngineInfo>,
    pub max_file_size_bytes: usize,
    pub default_language: String,
    pub default_sensitivity: u8,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/extract", post(handle_extract))
        .route("/extract/:engine", post(handle_extract_with_engine))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        // The expected caller is a browser page
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let registry = EngineRegistry::new(&config)?;
    tracing::info!(
        "Available engines: {:?} (default: {})",
        registry.list(),
        registry.default_name()
    );

    let addr = format!("{}:{}", config.host, config.port);
    let app = router(AppState::new(registry, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle extraction with the default engine
async fn handle_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, OcrError> {
    let engine = state
        .registry
        .default()
        .ok_or_else(|| OcrError::Internal("No default engine".to_string()))?;
    extract(state, engine, multipart).await
}

/// Handle extraction with an explicitly selected engine
async fn handle_extract_with_engine(
    State(state): State<AppState>,
    Path(engine_name): Path<String>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, OcrError> {
    let engine = state
        .registry
        .get(&engine_name)
        .ok_or(OcrError::UnknownEngine(engine_name))?;
    extract(state, engine, multipart).await
}

/// Fields parsed out of the multipart form
struct ExtractRequest {
    data: Bytes,
    language: String,
    options: EnhanceOptions,
}

async fn extract(
    state: AppState,
    engine: Arc<dyn OcrEngine>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, OcrError> {
    let start = Instant::now();

    // Reject concurrent extractions; the permit is held until this
    // request completes
    let _permit = state
        .busy
        .clone()
        .try_acquire_owned()
        .map_err(|_| OcrError::Busy)?;

    let request = parse_request(multipart, &state.config).await?;

    if request.data.len() > state.config.max_file_size {
        return Err(OcrError::ImageTooLarge {
            size: request.data.len(),
            max: state.config.max_file_size,
        });
    }

    let engine_name = engine.name().to_string();
    let ExtractRequest {
        data,
        language,
        options,
    } = request;

    // Pixel work and recognition are synchronous; keep them off the
    // async runtime
    let (preprocessing, result) = tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::new(options);
        let preprocessed = pipeline.process(&data)?;

        let report = |p: Progress| {
            tracing::debug!(
                stage = p.stage.as_str(),
                percent = (p.fraction * 100.0).round() as u32,
                "recognition progress"
            );
        };
        let result = engine.recognize(&preprocessed.bytes, &language, &report)?;

        Ok::<_, OcrError>((preprocessed, result))
    })
    .await
    .map_err(|e| OcrError::Internal(format!("Extraction task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Extraction completed in {}ms (engine: {}, enhanced: {}, text length: {})",
        processing_time_ms,
        engine_name,
        preprocessing.applied,
        result.text.len()
    );

    Ok(Json(ExtractResponse {
        text: result.text,
        engine: engine_name,
        processing_time_ms,
        warnings: result.warnings,
        preprocessing,
    }))
}

/// Parse the multipart form into an extraction request
async fn parse_request(mut multipart: Multipart, config: &Config) -> Result<ExtractRequest, OcrError> {
    let mut file_data: Option<Bytes> = None;
    let mut language: Option<String> = None;
    let mut sensitivity: Option<i64> = None;
    let mut enhance: Option<bool> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                file_data = Some(field.bytes().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "language" => {
                language = Some(field.text().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Invalid language: {}", e))
                })?);
            }
            "sensitivity" => {
                let text = field.text().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Invalid sensitivity: {}", e))
                })?;
                // Out-of-range values are clamped later; only a
                // non-numeric value is a malformed request
                sensitivity = Some(text.trim().parse::<i64>().map_err(|_| {
                    OcrError::InvalidRequest(format!("Sensitivity is not a number: {:?}", text))
                })?);
            }
            "enhance" => {
                let text = field.text().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Invalid enhance flag: {}", e))
                })?;
                enhance = Some(parse_bool(&text)?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(OcrError::MissingFile)?;

    Ok(ExtractRequest {
        data,
        language: language.unwrap_or_else(|| config.default_language.clone()),
        options: EnhanceOptions::new(
            enhance.unwrap_or(true),
            sensitivity.unwrap_or(config.default_sensitivity as i64),
        ),
    })
}

fn parse_bool(text: &str) -> Result<bool, OcrError> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(OcrError::InvalidRequest(format!(
            "Enhance flag must be a boolean, got {:?}",
            other
        ))),
    }
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        default_engine: state.registry.default_name().to_string(),
        available_engines: state.registry.info(),
        max_file_size_bytes: state.config.max_file_size,
        default_language: state.config.default_language.clone(),
        default_sensitivity: state.config.default_sensitivity,
    })
}
