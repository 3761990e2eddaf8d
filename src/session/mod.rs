//! セッションコーディネータ
//!
//! 多数の同時接続と、単一で非リエントラントな認識エンジンの間に立つ
//! オーケストレーション層。
//!
//! - セッションの開始/プッシュ/終了（レジストリ連携）
//! - エンジン呼び出しのプロセス全域での直列化
//! - デコード可能なバッファのドレイン（プッシュ毎に残量ゼロまで）
//! - ロック待ちを含むレイテンシ計測
//!
//! デコード直列化リソースとレジストリのロックは別物。前者はエンジンの
//! 非リエントラント性を守るための排他で、後者はただの台帳保護。

mod error;
mod registry;

pub use error::SessionError;
pub use registry::SessionRegistry;

use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::audio::{decode_f32le, silence};
use crate::engine::{EngineError, StreamingRecognizer};

/// push が返す途中結果
#[derive(Debug, Clone, PartialEq)]
pub struct PartialTranscript {
    pub text: String,
    pub latency_ms: u64,
}

/// end が返す最終結果
#[derive(Debug, Clone, PartialEq)]
pub struct FinalTranscript {
    pub text: String,
}

pub struct StreamingCoordinator<E: StreamingRecognizer> {
    engine: Arc<E>,
    registry: SessionRegistry<E::Stream>,
    decode_lock: Arc<Mutex<()>>,
}

impl<E: StreamingRecognizer> StreamingCoordinator<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
            registry: SessionRegistry::new(),
            decode_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.active_count()
    }

    /// セッションを開始し、識別子を返す。デコード処理は行わない。
    pub fn start(&self) -> String {
        let session_id = Uuid::new_v4().simple().to_string();
        self.registry
            .insert(session_id.clone(), self.engine.create_stream());
        debug!(%session_id, "session started");
        session_id
    }

    /// 音声チャンクを投入し、途中仮説と待ち時間込みのレイテンシを返す。
    ///
    /// 空チャンクはエンジンに触れず即座に `{text: "", latency_ms: 0}` を
    /// 返す。キープアライブ用途の空プッシュがデコード直列化リソースを
    /// 奪い合わないための明示的な抜け道。
    pub async fn push(
        &self,
        session_id: &str,
        samples_b64: &str,
        sample_rate: u32,
    ) -> Result<PartialTranscript, SessionError> {
        let stream = self
            .registry
            .lookup(session_id)
            .ok_or_else(|| SessionError::NotFound {
                session_id: session_id.to_string(),
            })?;

        if samples_b64.is_empty() {
            return Ok(PartialTranscript {
                text: String::new(),
                latency_ms: 0,
            });
        }

        let payload =
            BASE64_STANDARD
                .decode(samples_b64.as_bytes())
                .map_err(|e| SessionError::InvalidPayload {
                    message: format!("invalid base64: {e}"),
                })?;
        if payload.is_empty() {
            return Ok(PartialTranscript {
                text: String::new(),
                latency_ms: 0,
            });
        }

        let samples = decode_f32le(&payload).map_err(|e| SessionError::InvalidPayload {
            message: format!("invalid payload: {e}"),
        })?;

        let engine = Arc::clone(&self.engine);
        let decode_lock = Arc::clone(&self.decode_lock);

        // エンジン処理はCPU集約なのでブロッキングスレッドへ
        tokio::task::spawn_blocking(move || {
            // 計測はロック取得の試行直前から。他セッションの背後で並んだ
            // 待ち時間もクライアント観測レイテンシとして含める。
            let started = Instant::now();
            let _decode = decode_lock.lock();
            let mut stream = stream.lock();

            engine.accept_waveform(&mut stream, sample_rate, &samples);
            while engine.is_ready(&stream) {
                engine.decode_step(&mut stream)?;
            }
            let text = engine.transcript(&stream).into_text();

            drop(stream);
            drop(_decode);
            Ok::<_, SessionError>(PartialTranscript {
                text,
                latency_ms: started.elapsed().as_millis() as u64,
            })
        })
        .await
        .map_err(|e| {
            SessionError::Engine(EngineError::Decode {
                message: format!("decode task failed: {e}"),
            })
        })?
    }

    /// セッションを終了し、最終テキストを返す。
    ///
    /// レジストリからの取り外しが成功した瞬間、この識別子は永久に無効。
    /// 同じ識別子への後続の push/end は NotFound になる。
    pub async fn end(&self, session_id: &str) -> Result<FinalTranscript, SessionError> {
        let stream = self
            .registry
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound {
                session_id: session_id.to_string(),
            })?;

        let engine = Arc::clone(&self.engine);
        let decode_lock = Arc::clone(&self.decode_lock);

        let final_transcript = tokio::task::spawn_blocking(move || {
            let _decode = decode_lock.lock();
            let mut stream = stream.lock();

            engine.finish(&mut stream);
            while engine.is_ready(&stream) {
                engine.decode_step(&mut stream)?;
            }
            let text = engine.transcript(&stream).into_text();

            Ok::<_, SessionError>(FinalTranscript { text })
        })
        .await
        .map_err(|e| {
            SessionError::Engine(EngineError::Decode {
                message: format!("decode task failed: {e}"),
            })
        })??;

        debug!(%session_id, "session finalized");
        Ok(final_transcript)
    }

    /// ウォームアップ: 登録されないストリームに無音1秒を1回通す。
    /// 初回リクエストが払うはずのコールドスタートコストの先払い。
    pub async fn warm_up(&self, sample_rate: u32) -> Result<(), SessionError> {
        let engine = Arc::clone(&self.engine);
        let decode_lock = Arc::clone(&self.decode_lock);

        tokio::task::spawn_blocking(move || {
            let samples = silence(sample_rate, 1000);
            let _decode = decode_lock.lock();
            let mut stream = engine.create_stream();

            engine.accept_waveform(&mut stream, sample_rate, &samples);
            while engine.is_ready(&stream) {
                engine.decode_step(&mut stream)?;
            }
            engine.finish(&mut stream);
            while engine.is_ready(&stream) {
                engine.decode_step(&mut stream)?;
            }
            Ok::<_, SessionError>(())
        })
        .await
        .map_err(|e| {
            SessionError::Engine(EngineError::Decode {
                message: format!("warm-up task failed: {e}"),
            })
        })?
    }
}
