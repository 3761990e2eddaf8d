use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load model: {message}")]
    ModelLoad { message: String },
    #[error("decode failed: {message}")]
    Decode { message: String },
}
