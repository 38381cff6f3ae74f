//! Translation provider abstraction
//!
//! The sync engine only talks to [`TranslationProvider`]; the concrete backend is picked at
//! startup.

/// OpenAI chat completion backend
mod openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::document::Document;
use crate::locale::LocaleTag;
use crate::planner::ModelLimits;

pub use openai::OpenAiProvider;

/// Errors raised while talking to a provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// API キーの環境変数が未設定
    #[error("Environment variable {0} should contain the provider API key")]
    MissingApiKey(String),

    /// 送信や応答の読み込みに失敗
    #[error("Translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 成功以外のステータスが返った
    #[error("Translation request failed with status {status}: {body}")]
    Status {
        /// HTTP ステータスコード
        status: u16,
        /// 応答本文
        body: String,
    },

    /// 応答にメッセージ本文がない
    #[error("The translation failed to generate content")]
    EmptyContent,
}

/// Something that can translate a locale document into several locales in one call.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Token ceilings used to plan batches for this provider.
    fn limits(&self) -> ModelLimits;

    /// Translate `document` from `source_locale` into every locale in `target_locales`.
    ///
    /// `max_output_tokens` is the completion budget planned for this call. It is never more
    /// than [`ModelLimits::max_output_tokens`] and shrinks when the prompt eats into the
    /// context window.
    ///
    /// Returns the raw JSON text: an object keyed by target locale whose values mirror the
    /// structure of `document`. Validation is the caller's job.
    ///
    /// # Errors
    /// Returns an error when the request fails or the response carries no content.
    async fn translate(
        &self,
        source_locale: &LocaleTag,
        target_locales: &[LocaleTag],
        document: &Document,
        max_output_tokens: u64,
    ) -> Result<String, ProviderError>;
}
