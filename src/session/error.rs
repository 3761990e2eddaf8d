use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {session_id}")]
    NotFound { session_id: String },
    /// ペイロード不正。セッションは生きており、後続の正常なプッシュは通る
    #[error("{message}")]
    InvalidPayload { message: String },
    /// エンジン由来の回復不能な失敗。そのリクエスト限りで不透明に伝播する
    #[error("engine failure: {0}")]
    Engine(#[from] EngineError),
}
