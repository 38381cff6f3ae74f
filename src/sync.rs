//! Incremental locale synchronization
//!
//! One [`SyncEngine::run`] loads the source and the previous output, works out which locales
//! and keys changed, asks the provider for the minimum set of translations, and persists the
//! merged result. Any failure before the commit aborts the run before the store is touched.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use thiserror::Error;

use crate::config::{
    ConfigError,
    SyncOptions,
};
use crate::diff::diff;
use crate::document::{
    Document,
    KeyPath,
    LocaleDocuments,
};
use crate::locale::{
    LocaleTag,
    join_tags,
};
use crate::merge::{
    apply_deletions,
    build_delta,
    deleted_paths,
    merge_locale,
};
use crate::persistence::{
    LocaleStore,
    StoreError,
    StoreOutput,
};
use crate::planner::{
    PlanError,
    estimate_tokens,
    plan_batches,
};
use crate::prompt::{
    SYSTEM_PROMPT,
    document_json,
    user_message,
};
use crate::provider::{
    ProviderError,
    TranslationProvider,
};
use crate::schema::{
    MasterSchema,
    SchemaError,
    derive_schema,
};

/// Why a run failed.
#[derive(Error, Debug)]
pub enum SyncError {
    /// 設定またはソースの内容が不正
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// トークン予算に収まらない
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// プロバイダー呼び出しの失敗
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// ソースまたは応答の形が不正
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// 読み込み・書き込みの失敗
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What one run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Locales translated from scratch.
    pub added: Vec<LocaleTag>,
    /// Locales dropped from the output.
    pub removed: Vec<String>,
    /// Size of the edit script between the previous and current source.
    pub changes: usize,
    /// Source paths removed from every locale.
    pub deleted_paths: Vec<KeyPath>,
    /// Number of provider requests across every step.
    pub provider_calls: usize,
    /// What the store persisted.
    pub output: StoreOutput,
}

/// Translations of one step, keyed by locale.
type Translations = BTreeMap<LocaleTag, Document>;

/// Runs synchronization against one store and one provider.
pub struct SyncEngine {
    /// ソースの読み込みと出力の永続化
    store: Box<dyn LocaleStore>,
    /// 翻訳バックエンド
    provider: Arc<dyn TranslationProvider>,
    /// ソースロケールと対象ロケール
    options: SyncOptions,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine").field("options", &self.options).finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Engine over `store` and `provider` for the configured locales.
    #[must_use]
    pub const fn new(
        store: Box<dyn LocaleStore>,
        provider: Arc<dyn TranslationProvider>,
        options: SyncOptions,
    ) -> Self {
        Self { store, provider, options }
    }

    /// Target locales that need a translation (the source locale is always copied verbatim).
    fn translation_targets(&self) -> Vec<LocaleTag> {
        self.options
            .target_locales
            .iter()
            .filter(|locale| **locale != self.options.source_locale)
            .cloned()
            .collect()
    }

    /// ソースロケールまたは対象ロケールに含まれるか
    fn is_configured(&self, locale: &str) -> bool {
        self.options.source_locale.as_str() == locale
            || self.options.target_locales.iter().any(|target| target.as_str() == locale)
    }

    /// Synchronize the output with the current source.
    ///
    /// # Errors
    /// - The source is empty, cannot be read, or is not valid locale content
    /// - A translation step cannot be planned
    /// - The provider fails or returns a document with the wrong shape
    /// - The output cannot be written
    pub async fn run(&mut self) -> Result<SyncReport, SyncError> {
        let source = self.store.source_document()?;
        if source.is_empty() {
            return Err(ConfigError::EmptySource.into());
        }
        // プロバイダーを呼ばない実行でもソースの形を検証する
        derive_schema(&source)?;

        let source_key = self.options.source_locale.as_str().to_string();
        let targets = self.translation_targets();
        let mut provider_calls = 0;

        let Some(previous) = self.store.previous_locales()? else {
            tracing::info!("No previous output found, generating every locale");

            let (translations, calls) = self.translate(&targets, &source).await?;
            provider_calls += calls;

            let mut output = LocaleDocuments::new();
            output.insert(source_key.clone(), source);
            output.extend(translations.into_iter().map(|(locale, doc)| (locale.to_string(), doc)));

            let output = self.store.output_locales(&output, &source_key)?;
            tracing::info!("Finished generating");
            return Ok(SyncReport {
                added: targets,
                removed: Vec::new(),
                changes: 0,
                deleted_paths: Vec::new(),
                provider_calls,
                output,
            });
        };

        let mut output = previous;

        let removed: Vec<String> =
            output.keys().filter(|locale| !self.is_configured(locale)).cloned().collect();
        for locale in &removed {
            output.remove(locale);
        }

        let baseline = output.get(&source_key).cloned();
        let (added, existing): (Vec<LocaleTag>, Vec<LocaleTag>) = match &baseline {
            Some(_) => {
                targets.into_iter().partition(|locale| !output.contains_key(locale.as_str()))
            }
            None => {
                tracing::warn!(
                    source_locale = %self.options.source_locale,
                    "Previous output has no source locale entry, regenerating every locale"
                );
                (targets, Vec::new())
            }
        };

        if !added.is_empty() {
            tracing::info!("Added the following locale(s): {}", join_tags(&added));
            let (translations, calls) = self.translate(&added, &source).await?;
            provider_calls += calls;
            for (locale, document) in translations {
                output.insert(locale.to_string(), document);
            }
        }

        let changes = baseline.map_or_else(Vec::new, |baseline| {
            diff(&Value::Object(baseline), &Value::Object(source.clone()))
        });
        let deletions = deleted_paths(&changes);

        if changes.is_empty() {
            tracing::debug!("Source document unchanged");
        } else {
            let delta = build_delta(&changes);
            tracing::debug!(
                changes = changes.len(),
                deletions = deletions.len(),
                "Source document changed"
            );

            if !delta.is_empty() {
                let (translations, calls) = self.translate(&existing, &delta).await?;
                provider_calls += calls;
                for (locale, document) in translations {
                    merge_locale(&mut output, locale.as_str(), document);
                }
            }

            for document in output.values_mut() {
                apply_deletions(document, &deletions);
            }
        }

        output.insert(source_key.clone(), source);

        // 翻訳がすべて成功してから永続化し、ロケールの削除はコミットの後に行う
        let persisted = self.store.output_locales(&output, &source_key)?;
        for locale in &removed {
            self.store.remove_locale(locale, &mut output)?;
        }
        if !removed.is_empty() {
            tracing::info!("Removed the following locale(s): {}", removed.join(", "));
        }
        tracing::info!("Finished generating");

        Ok(SyncReport {
            added,
            removed,
            changes: changes.len(),
            deleted_paths: deletions,
            provider_calls,
            output: persisted,
        })
    }

    /// Translate `document` into `targets`, split into batches that fit the model limits.
    ///
    /// Returns the validated translations and the number of provider calls made.
    async fn translate(
        &self,
        targets: &[LocaleTag],
        document: &Document,
    ) -> Result<(Translations, usize), SyncError> {
        if targets.is_empty() {
            return Ok((Translations::new(), 0));
        }

        let schema = derive_schema(document)?;
        let master = MasterSchema::broadcast(targets, &schema);

        let user = user_message(&self.options.source_locale, targets, document);
        let prompt_tokens = estimate_tokens(&[SYSTEM_PROMPT, &user]);
        let source_tokens = estimate_tokens(&[&document_json(document)]);
        let plan = plan_batches(prompt_tokens, source_tokens, targets, self.provider.limits())?;

        tracing::debug!(
            locales = targets.len(),
            batches = plan.batches.len(),
            prompt_tokens,
            source_tokens,
            remaining = plan.remaining_budget,
            "Planned translation"
        );

        let results = try_join_all(plan.batches.iter().map(|batch| {
            self.translate_batch(batch, document, &master, plan.remaining_budget)
        }))
        .await?;

        let translations = results.into_iter().flatten().collect();
        Ok((translations, plan.batches.len()))
    }

    /// 1 バッチ分をプロバイダーに送り、応答をバッチのスキーマで検証する
    async fn translate_batch(
        &self,
        batch: &[LocaleTag],
        document: &Document,
        master: &MasterSchema,
        max_output_tokens: u64,
    ) -> Result<Translations, SyncError> {
        tracing::debug!("Translating into {}", join_tags(batch));
        let raw = self
            .provider
            .translate(&self.options.source_locale, batch, document, max_output_tokens)
            .await?;
        Ok(master.subset(batch).validate_response(&raw, &self.options.source_locale)?)
    }
}
