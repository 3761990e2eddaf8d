use crate::config::Config;
use crate::engine::StreamingRecognizer;
use crate::models::*;
use crate::session::{SessionError, StreamingCoordinator};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// =============================================================================
// Application State
// - ハンドラ間で共有する情報を集約（設定、コーディネータ、統計、起動時刻）
// =============================================================================

pub struct AppState<E: StreamingRecognizer> {
    pub config: Arc<Config>,
    pub coordinator: Arc<StreamingCoordinator<E>>,
    pub stats: Arc<Mutex<ServerStats>>,
    pub start_time: Arc<Instant>,
}

// E 自体は Clone でなくてよいので手動実装
impl<E: StreamingRecognizer> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            coordinator: Arc::clone(&self.coordinator),
            stats: Arc::clone(&self.stats),
            start_time: Arc::clone(&self.start_time),
        }
    }
}

impl<E: StreamingRecognizer> AppState<E> {
    pub fn new(config: Config, engine: E) -> Self {
        Self {
            config: Arc::new(config),
            coordinator: Arc::new(StreamingCoordinator::new(engine)),
            stats: Arc::new(Mutex::new(ServerStats::default())),
            start_time: Arc::new(Instant::now()),
        }
    }
}

// =============================================================================
// Error Handling
// - 型付きのセッションエラーをここで一度だけHTTP表現へ変換する
// =============================================================================

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound { .. } => {
                ApiError::new(ApiErrorCode::SessionNotFound, "session not found")
            }
            SessionError::InvalidPayload { message } => {
                ApiError::new(ApiErrorCode::InvalidInput, message)
            }
            SessionError::Engine(source) => {
                ApiError::new(ApiErrorCode::EngineFailure, "engine failure")
                    .with_details(source.to_string())
            }
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match self.code {
            ApiErrorCode::SessionNotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ApiErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorCode::EngineFailure => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = ErrorResponse {
            error: self.message,
            code: self.code.as_str().to_string(),
            details: self.details,
        };

        (status_code, Json(response)).into_response()
    }
}

// =============================================================================
// Request Handlers
// =============================================================================

/// セッション開始エンドポイント
pub async fn start_session<E: StreamingRecognizer>(
    State(state): State<AppState<E>>,
) -> ApiResult<Json<StartResponse>> {
    let session_id = state.coordinator.start();
    state.stats.lock().record_session_started();
    Ok(Json(StartResponse { session_id }))
}

/// 音声チャンク投入エンドポイント
pub async fn push_audio<E: StreamingRecognizer>(
    State(state): State<AppState<E>>,
    Json(request): Json<PushRequest>,
) -> ApiResult<Json<PushResponse>> {
    // ペイロードサイズの検証（base64文字列長で判定）
    if request.samples.len() > state.config.max_chunk_bytes() {
        return Err(ApiError::new(
            ApiErrorCode::PayloadTooLarge,
            format!(
                "chunk exceeds limit: {} > {}",
                request.samples.len(),
                state.config.max_chunk_bytes()
            ),
        ));
    }

    let result = state
        .coordinator
        .push(&request.session_id, &request.samples, request.sample_rate)
        .await;

    match &result {
        Ok(partial) => state.stats.lock().record_push(partial.latency_ms),
        Err(_) => state.stats.lock().record_push_failure(),
    }

    let partial = result?;
    Ok(Json(PushResponse {
        text: partial.text,
        latency_ms: partial.latency_ms,
    }))
}

/// セッション終了エンドポイント
pub async fn end_session<E: StreamingRecognizer>(
    State(state): State<AppState<E>>,
    Json(request): Json<EndRequest>,
) -> ApiResult<Json<EndResponse>> {
    let final_transcript = state.coordinator.end(&request.session_id).await?;
    state.stats.lock().record_session_completed();
    Ok(Json(EndResponse {
        text: final_transcript.text,
    }))
}

/// ヘルスチェックエンドポイント
pub async fn health_check<E: StreamingRecognizer>(
    State(state): State<AppState<E>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        active_sessions: state.coordinator.active_sessions(),
    })
}

/// サーバー統計情報を取得
pub async fn get_stats<E: StreamingRecognizer>(
    State(state): State<AppState<E>>,
) -> Json<ServerStats> {
    let mut stats = state.stats.lock().clone();
    stats.uptime_seconds = state.start_time.elapsed().as_secs();
    Json(stats)
}

// =============================================================================
// Router
// =============================================================================

pub fn build_router<E: StreamingRecognizer>(state: AppState<E>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/stream/start", post(start_session::<E>))
        .route("/v1/stream/push", post(push_audio::<E>))
        .route("/v1/stream/end", post(end_session::<E>))
        .route("/health", get(health_check::<E>))
        .route("/stats", get(get_stats::<E>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
