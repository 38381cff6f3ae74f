//! OpenAI chat completion backend.

use async_trait::async_trait;
use serde::{
    Deserialize,
    Serialize,
};

use super::{
    ProviderError,
    TranslationProvider,
};
use crate::config::ProviderSettings;
use crate::document::Document;
use crate::locale::LocaleTag;
use crate::planner::ModelLimits;
use crate::prompt::{
    SYSTEM_PROMPT,
    user_message,
};

/// `/chat/completions` request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    /// モデル名
    model: &'a str,
    /// システムプロンプトとユーザーメッセージ
    messages: [ChatMessage<'a>; 2],
    /// この呼び出しの出力トークン上限
    max_tokens: u64,
    /// JSON モードの指定
    response_format: ResponseFormat,
}

/// One chat message.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    /// `system` or `user`
    role: &'static str,
    /// 本文
    content: &'a str,
}

/// `{"type": "json_object"}`
#[derive(Debug, Serialize)]
struct ResponseFormat {
    /// 応答形式の種類
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Only the parts of the response we read.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// 生成結果 (先頭だけ使う)
    #[serde(default)]
    choices: Vec<Choice>,
}

/// One generated completion.
#[derive(Debug, Deserialize)]
struct Choice {
    /// 生成されたメッセージ
    message: ResponseMessage,
}

/// Message of a completion.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    /// 本文。拒否された場合などは `null`
    #[serde(default)]
    content: Option<String>,
}

/// Translates via `POST {base_url}/chat/completions` in JSON mode.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    /// 接続を使い回す HTTP クライアント
    client: reqwest::Client,
    /// Bearer トークン
    api_key: String,
    /// モデル名
    model: String,
    /// `{base_url}/chat/completions`
    endpoint: String,
    /// バッチ計画に使うトークン上限
    limits: ModelLimits,
}

impl OpenAiProvider {
    /// Provider for `settings` authenticated with `api_key`.
    #[must_use]
    pub fn new(settings: &ProviderSettings, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: settings.model.clone(),
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            limits: settings.limits(),
        }
    }

    /// Read the API key from the environment variable named in `settings`.
    ///
    /// # Errors
    /// - The variable is unset or empty
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey(settings.api_key_env.clone()))?;
        Ok(Self::new(settings, api_key))
    }

    /// JSON モードのリクエストを組み立てる。`max_tokens` は計画済みの出力予算
    fn request_body<'a>(&'a self, user: &'a str, max_tokens: u64) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: user },
            ],
            max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        }
    }
}

/// First choice's message content, if the model produced any.
fn extract_content(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ProviderError::EmptyContent)
}

#[async_trait]
impl TranslationProvider for OpenAiProvider {
    fn limits(&self) -> ModelLimits {
        self.limits
    }

    async fn translate(
        &self,
        source_locale: &LocaleTag,
        target_locales: &[LocaleTag],
        document: &Document,
        max_output_tokens: u64,
    ) -> Result<String, ProviderError> {
        let user = user_message(source_locale, target_locales, document);

        tracing::debug!(
            model = %self.model,
            locales = target_locales.len(),
            max_output_tokens,
            "Sending translation request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&user, max_output_tokens))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status: status.as_u16(), body });
        }

        extract_content(response.json::<ChatResponse>().await?)
    }
}
