//! 音声ペイロードのユーティリティ
//!
//! ワイヤ上のチャンクは f32(little-endian) モノラルPCM。フレーム境界への
//! 整列は仮定しない。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload length {len} is not a multiple of 4 bytes")]
    Misaligned { len: usize },
}

/// f32(LE) のバイト列をサンプル列へ展開
pub fn decode_f32le(bytes: &[u8]) -> Result<Vec<f32>, PayloadError> {
    if bytes.len() % 4 != 0 {
        return Err(PayloadError::Misaligned { len: bytes.len() });
    }

    let mut samples = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        samples.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(samples)
}

/// 指定長の無音サンプルを生成（ウォームアップ用）
pub fn silence(sample_rate: u32, duration_ms: u64) -> Vec<f32> {
    vec![0.0; ((sample_rate as u64 * duration_ms) / 1000) as usize]
}

/// 線形補間による簡易リサンプル
pub fn resample_linear(samples: &[f32], input_rate: u32, output_rate: u32) -> Vec<f32> {
    if input_rate == output_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = output_rate as f64 / input_rate as f64;
    let output_len = (samples.len() as f64 * ratio).round() as usize;
    if output_len == 0 {
        return Vec::new();
    }

    let mut output = Vec::with_capacity(output_len);
    for n in 0..output_len {
        let position = n as f64 / ratio;
        let base_index = position.floor() as usize;
        let frac = position - base_index as f64;
        let a = samples
            .get(base_index)
            .copied()
            .unwrap_or(*samples.last().unwrap_or(&0.0));
        let b = samples.get(base_index + 1).copied().unwrap_or(a);
        output.push(a + (b - a) * frac as f32);
    }
    output
}
