use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 設定ファイルのパスを指す環境変数名
pub const CONFIG_PATH_ENV: &str = "STREAMING_ASR_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub model_path: String,
    pub language: String,
    pub threads: usize,
    pub enable_gpu: bool,
    /// エンジンが期待する入力サンプルレート（Hz）
    pub sample_rate: u32,
    /// この長さ分のバッファが溜まるたびに1デコードステップ
    pub decode_window_ms: u64,
    /// 起動時ウォームアップ（無音1秒の先行デコード）
    pub warmup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// pushペイロード（base64文字列）の最大サイズ（KB）
    pub max_chunk_kb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8790,
                cors_origins: vec!["*".to_string()],
            },
            engine: EngineConfig {
                model_path: "models/ggml-base.bin".to_string(),
                language: "auto".to_string(),
                threads: 4,
                enable_gpu: false,
                sample_rate: 16000,
                decode_window_ms: 1000,
                warmup: true,
            },
            limits: LimitsConfig { max_chunk_kb: 4096 },
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 設定ファイルを読み込み、無ければデフォルトを書き出して返す
    pub fn load_or_create_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(&path)
        } else {
            let config = Self::default();
            config.save_to_file(&path)?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("invalid server port: {}", self.server.port));
        }

        if self.engine.threads == 0 {
            return Err(anyhow::anyhow!("engine threads must be at least 1"));
        }

        if !(8000..=48000).contains(&self.engine.sample_rate) {
            return Err(anyhow::anyhow!(
                "unsupported engine sample rate: {}",
                self.engine.sample_rate
            ));
        }

        if self.engine.decode_window_ms == 0 {
            return Err(anyhow::anyhow!("decode window must be at least 1 ms"));
        }

        if self.limits.max_chunk_kb == 0 {
            return Err(anyhow::anyhow!("max chunk size must be at least 1 KB"));
        }

        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn max_chunk_bytes(&self) -> usize {
        self.limits.max_chunk_kb * 1024
    }
}

impl EngineConfig {
    /// デコードウィンドウをサンプル数に換算
    pub fn decode_window_samples(&self) -> usize {
        ((self.sample_rate as u64 * self.decode_window_ms) / 1000).max(1) as usize
    }
}
