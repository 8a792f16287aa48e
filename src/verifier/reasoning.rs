//! 推論サービス連携
//!
//! OpenAI互換の chat completions API（既定は Groq）を呼び出し、
//! 生テキストの応答を返す。応答の検証は呼び出し側で行う。

use crate::config::ReasoningConfig;
use crate::error::{MarkingError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 推論サービス
///
/// `Err` はすべて通信レベルの失敗（タイムアウト、接続エラー、サービス側の例外）。
#[async_trait]
pub trait ReasoningService: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// chat completions リクエスト
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// chat completions レスポンス
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatCompletionsClient {
    client: reqwest::Client,
    config: ReasoningConfig,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(config: ReasoningConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MarkingError::Config(format!("HTTPクライアント生成エラー: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl ReasoningService for ChatCompletionsClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
        };

        debug!("推論API呼び出し: {} ({} chars)", self.config.model, user.len());

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let preview: String = text.chars().take(200).collect();
            return Err(MarkingError::Transport(format!(
                "推論API error ({}): {}",
                status.as_u16(),
                preview
            )));
        }

        let payload: ChatResponse = response.json().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| MarkingError::Transport("推論APIの応答に choices がありません".into()))?;

        debug!("推論API応答: {} chars", content.len());
        Ok(content)
    }
}

/// APIキー未設定時の推論サービス
///
/// 呼び出しは常に失敗し、判定エンジンは INDETERMINATE を返す。
/// 検索だけ（`retrieve`）ならキーなしでも動くようにするため。
pub struct UnconfiguredReasoning;

#[async_trait]
impl ReasoningService for UnconfiguredReasoning {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Err(MarkingError::MissingApiKey)
    }
}
