use crate::error::{MarkingError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub reasoning: ReasoningConfig,
    pub search: SearchConfig,
    pub download: DownloadConfig,
    /// 検証済み仕様書（PDF）の置き場所
    pub fallback_dir: PathBuf,
    /// 人による確認結果のキャッシュ
    pub cache_file: PathBuf,
    /// 同一入力の判定を覚えておく件数（0で無効）
    pub memo_capacity: usize,
}

/// 推論サービス設定（OpenAI互換 chat completions）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub timeout_seconds: u64,
    pub max_bytes: u64,
    /// 1文書あたりの解析時間の上限
    pub parse_timeout_seconds: u64,
    /// 一時ファイルの作業ディレクトリ
    pub work_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            reasoning: ReasoningConfig::default(),
            search: SearchConfig::default(),
            download: DownloadConfig::default(),
            fallback_dir: PathBuf::from("sample_datasheets"),
            cache_file: PathBuf::from("verified_cache.json"),
            memo_capacity: 128,
        }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1/chat/completions".into(),
            model: "llama-3.1-8b-instant".into(),
            temperature: 0.1,
            timeout_seconds: 30,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: marking_verify_common::prompts::DEFAULT_SEARCH_RESULTS,
            timeout_seconds: 15,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 20,
            max_bytes: 50 * 1024 * 1024,
            parse_timeout_seconds: 60,
            work_dir: std::env::temp_dir().join("marking-verify"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MarkingError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("marking-verify").join("config.json"))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key.clone().ok_or(MarkingError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }
}
