use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use streaming_asr_api::config::{Config, CONFIG_PATH_ENV};
use streaming_asr_api::handlers::{build_router, AppState};
use streaming_asr_api::warmup::spawn_warmup;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // 設定ファイルの読み込み（無ければデフォルトを書き出す）
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load_or_create_default(&config_path)?;
    config.validate()?;
    info!(path = %config_path, "configuration loaded");

    let engine = build_engine(&config)?;
    let sample_rate = config.engine.sample_rate;
    let warmup = config.engine.warmup;
    let addr: SocketAddr = config
        .server_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server address: {e}"))?;

    let state = AppState::new(config, engine);

    if warmup {
        spawn_warmup(Arc::clone(&state.coordinator), sample_rate);
    }

    let app = build_router(state);

    info!(%addr, "streaming ASR server listening");
    info!("  POST /v1/stream/start - open a session");
    info!("  POST /v1/stream/push  - push an audio chunk");
    info!("  POST /v1/stream/end   - finalize a session");
    info!("  GET  /health          - health check");
    info!("  GET  /stats           - server statistics");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    Ok(())
}

#[cfg(feature = "whisper")]
fn build_engine(
    config: &Config,
) -> anyhow::Result<streaming_asr_api::engine::whisper::WhisperStreamEngine> {
    let engine = streaming_asr_api::engine::whisper::WhisperStreamEngine::new(&config.engine)?;
    info!(model = %config.engine.model_path, "whisper engine initialized");
    Ok(engine)
}

#[cfg(not(feature = "whisper"))]
fn build_engine(config: &Config) -> anyhow::Result<streaming_asr_api::engine::mock::MockRecognizer> {
    // whisper フィーチャー無効時は決定的な開発用エンジンで起動する
    tracing::warn!("whisper feature disabled; serving the deterministic development engine");
    Ok(streaming_asr_api::engine::mock::MockRecognizer::new(
        config.engine.decode_window_samples(),
    ))
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}
