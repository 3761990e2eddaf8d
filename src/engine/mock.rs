//! 決定的な開発/テスト用エンジン
//!
//! 実モデルを使わずにコーディネータの直列化・ドレイン・レイテンシ計測を
//! 検証するための実装。ウィンドウ1つ分のバッファが溜まるごとに1ステップ
//! デコードし、有声ウィンドウごとに固定トークンを仮説へ追加する。
//! 無音ウィンドウはトークンを生まない。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{EngineError, RawTranscript, StreamingRecognizer, TranscriptDetail};

/// 有声判定のしきい値（絶対振幅）
const VOICED_THRESHOLD: f32 = 1e-3;

pub struct MockRecognizer {
    window_samples: usize,
    decode_delay: Option<Duration>,
    fail_decode: bool,
    calls: AtomicU64,
    decode_spans: Mutex<Vec<(Instant, Instant)>>,
}

pub struct MockStream {
    pending: Vec<f32>,
    segments: Vec<String>,
    finished: bool,
}

impl MockRecognizer {
    pub fn new(window_samples: usize) -> Self {
        Self {
            window_samples: window_samples.max(1),
            decode_delay: None,
            fail_decode: false,
            calls: AtomicU64::new(0),
            decode_spans: Mutex::new(Vec::new()),
        }
    }

    /// デコード1ステップごとに指定時間スリープする（競合試験用）
    pub fn with_decode_delay(mut self, delay: Duration) -> Self {
        self.decode_delay = Some(delay);
        self
    }

    /// デコードステップを常に失敗させる（エンジン障害の注入）
    pub fn with_decode_failure(mut self) -> Self {
        self.fail_decode = true;
        self
    }

    /// ストリーム作成を除くエンジン呼び出しの累計
    pub fn engine_calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// 各デコードステップの開始/終了時刻
    pub fn decode_spans(&self) -> Vec<(Instant, Instant)> {
        self.decode_spans.lock().clone()
    }
}

impl StreamingRecognizer for MockRecognizer {
    type Stream = MockStream;

    fn create_stream(&self) -> MockStream {
        MockStream {
            pending: Vec::new(),
            segments: Vec::new(),
            finished: false,
        }
    }

    fn accept_waveform(&self, stream: &mut MockStream, _sample_rate: u32, samples: &[f32]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        stream.pending.extend_from_slice(samples);
    }

    fn is_ready(&self, stream: &MockStream) -> bool {
        stream.pending.len() >= self.window_samples
            || (stream.finished && !stream.pending.is_empty())
    }

    fn decode_step(&self, stream: &mut MockStream) -> Result<(), EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();

        if let Some(delay) = self.decode_delay {
            std::thread::sleep(delay);
        }

        if self.fail_decode {
            return Err(EngineError::Decode {
                message: "injected decode failure".to_string(),
            });
        }

        let take = stream.pending.len().min(self.window_samples);
        let window: Vec<f32> = stream.pending.drain(..take).collect();
        if window.iter().any(|s| s.abs() > VOICED_THRESHOLD) {
            stream.segments.push(format!("seg{}", stream.segments.len()));
        }

        self.decode_spans.lock().push((started, Instant::now()));
        Ok(())
    }

    fn transcript(&self, stream: &MockStream) -> RawTranscript {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if stream.segments.is_empty() {
            // 仮説なしの側は素のテキスト形態で返し、両形態を通す
            RawTranscript::Plain(String::new())
        } else {
            RawTranscript::Detailed(TranscriptDetail {
                text: stream.segments.join(" "),
                segments: stream.segments.clone(),
            })
        }
    }

    fn finish(&self, stream: &mut MockStream) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        stream.finished = true;
    }
}
