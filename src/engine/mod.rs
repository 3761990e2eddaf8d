//! 認識エンジン境界モジュール
//!
//! エンジンは外部コラボレータとして扱い、最小のトレイトで切り出す。
//! 実装は2つ:
//! - `whisper`: whisper-rs ベースの実エンジン（cargo feature `whisper`）
//! - `mock`: 実モデルなしで動く決定的な開発/テスト用エンジン
//!
//! エンジンのデコード処理はストリームが異なっても並行呼び出し不可。
//! 排他制御は呼び出し側（セッションコーディネータ）の責務。

mod error;
pub mod mock;

#[cfg(feature = "whisper")]
pub mod whisper;

pub use error::EngineError;

/// エンジンが返す結果の表現
///
/// 素のテキストか、テキストフィールドを持つ詳細結果のどちらか。
/// 境界で一度だけ `into_text` で正規化し、以降の層では区別しない。
#[derive(Debug, Clone, PartialEq)]
pub enum RawTranscript {
    Plain(String),
    Detailed(TranscriptDetail),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptDetail {
    pub text: String,
    pub segments: Vec<String>,
}

impl RawTranscript {
    /// どちらの形態でもテキストへ正規化（得られなければ空文字列）
    pub fn into_text(self) -> String {
        match self {
            RawTranscript::Plain(text) => text,
            RawTranscript::Detailed(detail) => detail.text,
        }
    }
}

/// ストリーミング認識エンジンの最小インタフェース
pub trait StreamingRecognizer: Send + Sync + 'static {
    /// セッション毎のデコード状態
    type Stream: Send + 'static;

    /// 新しいストリームを作成
    fn create_stream(&self) -> Self::Stream;

    /// サンプルを取り込み（呼び出し元が宣言したサンプルレート付き）
    fn accept_waveform(&self, stream: &mut Self::Stream, sample_rate: u32, samples: &[f32]);

    /// デコード可能なバッファが残っているか
    fn is_ready(&self, stream: &Self::Stream) -> bool;

    /// デコードを1ステップ進める
    fn decode_step(&self, stream: &mut Self::Stream) -> Result<(), EngineError>;

    /// 現時点の仮説を取得
    fn transcript(&self, stream: &Self::Stream) -> RawTranscript;

    /// 入力終了を通知
    fn finish(&self, stream: &mut Self::Stream);
}
