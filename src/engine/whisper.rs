//! whisper-rs ベースのストリーミングエンジン実装
//!
//! whisper.cpp は逐次デコードAPIを持たないため、累積サンプル全体への
//! 再デコードで増分仮説を更新する。1デコードステップ = 累積音声1回分の
//! 推論。ウィンドウ未満の残量は入力終了後にまとめてデコードする。

use std::path::Path;
use std::sync::Arc;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::resample_linear;
use crate::config::EngineConfig;

use super::{EngineError, RawTranscript, StreamingRecognizer, TranscriptDetail};

pub struct WhisperStreamEngine {
    context: Arc<WhisperContext>,
    language: Option<String>,
    threads: i32,
    sample_rate: u32,
    window_samples: usize,
}

pub struct WhisperStream {
    samples: Vec<f32>,
    decoded_samples: usize,
    finished: bool,
    text: String,
    segments: Vec<String>,
}

impl WhisperStreamEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        if !Path::new(&config.model_path).exists() {
            return Err(EngineError::ModelLoad {
                message: format!("model file not found: {}", config.model_path),
            });
        }

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu = config.enable_gpu;

        let context = WhisperContext::new_with_params(&config.model_path, ctx_params).map_err(
            |e| EngineError::ModelLoad {
                message: e.to_string(),
            },
        )?;

        // "auto" と空文字は言語自動検出
        let language = match config.language.trim() {
            "" => None,
            lang if lang.eq_ignore_ascii_case("auto") => None,
            lang => Some(lang.to_string()),
        };

        Ok(Self {
            context: Arc::new(context),
            language,
            threads: config.threads as i32,
            sample_rate: config.sample_rate,
            window_samples: config.decode_window_samples(),
        })
    }

    /// 累積サンプル全体を推論し、セグメントテキスト列を返す
    fn run_full(&self, samples: &[f32]) -> Result<Vec<String>, EngineError> {
        let mut state = self.context.create_state().map_err(|e| EngineError::Decode {
            message: format!("failed to create whisper state: {e}"),
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        if let Some(language) = self.language.as_deref() {
            params.set_language(Some(language));
        }
        params.set_n_threads(self.threads);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state.full(params, samples).map_err(|e| EngineError::Decode {
            message: format!("whisper inference failed: {e}"),
        })?;

        let segment_count = state.full_n_segments().map_err(|e| EngineError::Decode {
            message: format!("segment count failed: {e}"),
        })?;

        let mut segments = Vec::new();
        for i in 0..segment_count {
            let segment = state.full_get_segment_text(i).map_err(|e| EngineError::Decode {
                message: format!("get segment failed: {e}"),
            })?;
            let segment = segment.trim().to_string();
            if !segment.is_empty() {
                segments.push(segment);
            }
        }
        Ok(segments)
    }
}

impl StreamingRecognizer for WhisperStreamEngine {
    type Stream = WhisperStream;

    fn create_stream(&self) -> WhisperStream {
        WhisperStream {
            samples: Vec::new(),
            decoded_samples: 0,
            finished: false,
            text: String::new(),
            segments: Vec::new(),
        }
    }

    fn accept_waveform(&self, stream: &mut WhisperStream, sample_rate: u32, samples: &[f32]) {
        if sample_rate == self.sample_rate {
            stream.samples.extend_from_slice(samples);
        } else {
            stream
                .samples
                .extend(resample_linear(samples, sample_rate, self.sample_rate));
        }
    }

    fn is_ready(&self, stream: &WhisperStream) -> bool {
        let pending = stream.samples.len().saturating_sub(stream.decoded_samples);
        pending >= self.window_samples || (stream.finished && pending > 0)
    }

    fn decode_step(&self, stream: &mut WhisperStream) -> Result<(), EngineError> {
        let segments = self.run_full(&stream.samples)?;
        stream.text = segments.join("");
        stream.segments = segments;
        stream.decoded_samples = stream.samples.len();
        Ok(())
    }

    fn transcript(&self, stream: &WhisperStream) -> RawTranscript {
        RawTranscript::Detailed(TranscriptDetail {
            text: stream.text.clone(),
            segments: stream.segments.clone(),
        })
    }

    fn finish(&self, stream: &mut WhisperStream) {
        stream.finished = true;
    }
}
