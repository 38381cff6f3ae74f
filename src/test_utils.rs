//! テスト用ユーティリティ
//!
//! 複数のテストモジュールで使用される共通のヘルパーを提供します。
#![cfg(test)]
#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{
    Map,
    Value,
};

use crate::document::Document;
use crate::locale::LocaleTag;
use crate::planner::ModelLimits;
use crate::provider::{
    ProviderError,
    TranslationProvider,
};

/// JSON リテラルから `Document` を作成する
pub(crate) fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// ロケールタグのリストを作成する
pub(crate) fn tags(values: &[&str]) -> Vec<LocaleTag> {
    values.iter().map(|value| LocaleTag::parse(value).unwrap()).collect()
}

/// `MockProvider` が受け取ったリクエスト
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub source_locale: LocaleTag,
    pub target_locales: Vec<LocaleTag>,
    pub document: Document,
    /// 呼び出しに割り当てられた出力トークン数
    pub max_output_tokens: u64,
}

/// `MockProvider` の応答方法
#[derive(Debug, Clone)]
pub(crate) enum MockResponse {
    /// 各文字列の先頭に `[<locale>] ` を付けて返す
    Echo,
    /// 常に同じ文字列を返す
    Fixed(String),
    /// 指定したロケールを含むバッチだけ失敗する
    FailOn(LocaleTag),
}

/// 呼び出しを記録するテスト用プロバイダー
#[derive(Debug)]
pub(crate) struct MockProvider {
    response: MockResponse,
    limits: ModelLimits,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockProvider {
    pub(crate) const fn new(response: MockResponse) -> Self {
        Self {
            response,
            limits: ModelLimits { context_window: 128_000, max_output_tokens: 16_384 },
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) const fn echo() -> Self {
        Self::new(MockResponse::Echo)
    }

    pub(crate) fn fixed(raw: &str) -> Self {
        Self::new(MockResponse::Fixed(raw.to_string()))
    }

    pub(crate) const fn with_limits(mut self, limits: ModelLimits) -> Self {
        self.limits = limits;
        self
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// 文字列の葉に `[<locale>] ` を付ける
pub(crate) fn echo_translation(value: &Value, locale: &LocaleTag) -> Value {
    match value {
        Value::String(text) => Value::String(format!("[{locale}] {text}")),
        Value::Object(map) => Value::Object(
            map.iter().map(|(key, child)| (key.clone(), echo_translation(child, locale))).collect(),
        ),
        other => other.clone(),
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
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
        self.requests.lock().unwrap().push(RecordedRequest {
            source_locale: source_locale.clone(),
            target_locales: target_locales.to_vec(),
            document: document.clone(),
            max_output_tokens,
        });

        match &self.response {
            MockResponse::Fixed(raw) => Ok(raw.clone()),
            MockResponse::FailOn(locale) if target_locales.contains(locale) => {
                Err(ProviderError::EmptyContent)
            }
            MockResponse::Echo | MockResponse::FailOn(_) => {
                let source = Value::Object(document.clone());
                let response: Map<String, Value> = target_locales
                    .iter()
                    .map(|locale| (locale.to_string(), echo_translation(&source, locale)))
                    .collect();
                Ok(Value::Object(response).to_string())
            }
        }
    }
}
