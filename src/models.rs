use serde::{Deserialize, Serialize};

// =============================================================================
// API Request/Response Models
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: String,
}

fn default_sample_rate() -> u32 {
    16000
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PushRequest {
    pub session_id: String,
    /// f32(LE) モノラルPCMのbase64
    pub samples: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PushResponse {
    pub text: String,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndResponse {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub details: Option<String>,
}

// =============================================================================
// Server Statistics
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerStats {
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub pushes_total: u64,
    pub pushes_failed: u64,
    pub total_push_latency_ms: u64,
    pub average_push_latency_ms: f64,
    pub uptime_seconds: u64,
}

impl ServerStats {
    pub fn record_session_started(&mut self) {
        self.sessions_started += 1;
    }

    pub fn record_session_completed(&mut self) {
        self.sessions_completed += 1;
    }

    pub fn record_push(&mut self, latency_ms: u64) {
        self.pushes_total += 1;
        self.total_push_latency_ms += latency_ms;

        let succeeded = self.pushes_total - self.pushes_failed;
        if succeeded > 0 {
            self.average_push_latency_ms = self.total_push_latency_ms as f64 / succeeded as f64;
        }
    }

    pub fn record_push_failure(&mut self) {
        self.pushes_total += 1;
        self.pushes_failed += 1;
    }
}

// =============================================================================
// Error Codes
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiErrorCode {
    SessionNotFound,
    InvalidInput,
    PayloadTooLarge,
    EngineFailure,
    InternalError,
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ApiErrorCode::InvalidInput => "INVALID_INPUT",
            ApiErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ApiErrorCode::EngineFailure => "ENGINE_FAILURE",
            ApiErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}
