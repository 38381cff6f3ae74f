//! Token budget planning
//!
//! Decides how many provider calls are needed to translate one document into a list of
//! locales without exceeding the model's output-token ceiling.
//!
//! Ratios are stored in per-mille (`1200` = ×1.2) so that all arithmetic stays integral.

use thiserror::Error;

use crate::locale::LocaleTag;

/// Ratio applied to languages missing from [`LANGUAGE_MULTIPLIERS`].
pub const DEFAULT_MULTIPLIER_PERMILLE: u64 = 1200;

/// Per-mille divisor for multiplier arithmetic.
const PERMILLE: u64 = 1000;

/// Approximate characters per token for common English text.
const CHARS_PER_TOKEN: u64 = 4;

/// Output-token expansion relative to the source, keyed by base language code.
///
/// Non-Latin scripts and agglutinative languages tokenize into noticeably more tokens than
/// English for the same content.
pub const LANGUAGE_MULTIPLIERS: &[(&str, u64)] = &[
    ("en", 1000),
    ("da", 1150),
    ("nb", 1150),
    ("sv", 1150),
    ("es", 1200),
    ("it", 1200),
    ("pt", 1200),
    ("fr", 1250),
    ("nl", 1250),
    ("de", 1300),
    ("zh", 1300),
    ("cs", 1400),
    ("fi", 1400),
    ("pl", 1400),
    ("tr", 1400),
    ("ja", 1500),
    ("vi", 1500),
    ("ko", 1600),
    ("bg", 1700),
    ("ru", 1700),
    ("uk", 1700),
    ("ar", 1800),
    ("fa", 1800),
    ("he", 1800),
    ("el", 2000),
    ("th", 2500),
    ("hi", 2600),
];

/// Token ceilings of the translation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelLimits {
    /// Total tokens (prompt + completion) the model accepts.
    pub context_window: u64,
    /// Maximum completion tokens per call.
    pub max_output_tokens: u64,
}

impl ModelLimits {
    /// Prompt tokens that can be spent without eating into the output ceiling.
    #[must_use]
    pub const fn free_prompt_tokens(&self) -> u64 {
        self.context_window.saturating_sub(self.max_output_tokens)
    }
}

/// 翻訳ステップを計画できない理由
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// プロンプトだけでコンテキストウィンドウを使い切る
    #[error("Prompt exceeds token limit ({prompt_tokens} >= {context_window} tokens)")]
    PromptTooLarge {
        /// プロンプトの推定トークン数
        prompt_tokens: u64,
        /// モデルのコンテキストウィンドウ
        context_window: u64,
    },

    /// 1 ロケール分の出力すら残りの予算に収まらない
    #[error(
        "Generating '{locale}' will exceed token limit (estimated {estimated} tokens, {remaining} available)"
    )]
    LocaleExceedsBudget {
        /// 最もコストの高いロケール
        locale: LocaleTag,
        /// そのロケールの推定出力トークン数
        estimated: u64,
        /// 残りの出力予算
        remaining: u64,
    },

    /// 平均コストで割るとバッチサイズが 0 になる
    #[error("Batch size cannot be zero ({remaining} tokens available, {source_tokens} source tokens)")]
    ZeroBatchSize {
        /// 残りの出力予算
        remaining: u64,
        /// ソースの推定トークン数
        source_tokens: u64,
    },
}

/// Result of planning one translation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Estimated tokens of the system prompt plus user message.
    pub prompt_tokens: u64,
    /// Estimated tokens of the document being translated.
    pub source_tokens: u64,
    /// Completion tokens available to each call.
    pub remaining_budget: u64,
    /// Contiguous, order-preserving slices of the target list.
    pub batches: Vec<Vec<LocaleTag>>,
}

/// Estimate token count for one or more strings.
///
/// One token is roughly four characters of English text; the total is rounded to the nearest
/// token.
#[must_use]
pub fn estimate_tokens(texts: &[&str]) -> u64 {
    let chars: u64 = texts.iter().map(|text| text.chars().count() as u64).sum();
    (chars + CHARS_PER_TOKEN / 2) / CHARS_PER_TOKEN
}

/// Expansion ratio (per-mille) for a locale.
#[must_use]
pub fn multiplier_for(locale: &LocaleTag) -> u64 {
    let base = locale.base_language();
    LANGUAGE_MULTIPLIERS
        .iter()
        .find(|(code, _)| *code == base)
        .map_or(DEFAULT_MULTIPLIER_PERMILLE, |(_, multiplier)| *multiplier)
}

/// Estimated completion tokens needed to translate `source_tokens` into `locale`.
#[must_use]
pub fn estimated_cost(source_tokens: u64, locale: &LocaleTag) -> u64 {
    source_tokens.saturating_mul(multiplier_for(locale)).div_ceil(PERMILLE)
}

/// Completion tokens left once the prompt is accounted for.
///
/// # Errors
/// - The prompt alone meets or exceeds the context window
pub const fn remaining_output_budget(
    prompt_tokens: u64,
    limits: ModelLimits,
) -> Result<u64, PlanError> {
    if prompt_tokens >= limits.context_window {
        return Err(PlanError::PromptTooLarge {
            prompt_tokens,
            context_window: limits.context_window,
        });
    }
    let overflow = prompt_tokens.saturating_sub(limits.free_prompt_tokens());
    Ok(limits.max_output_tokens.saturating_sub(overflow))
}

/// Split `targets` into the fewest order-preserving batches that fit the output budget.
///
/// # Errors
/// - The prompt exceeds the context window
/// - A single locale cannot fit in one call
/// - The computed batch size is zero
pub fn plan_batches(
    prompt_tokens: u64,
    source_tokens: u64,
    targets: &[LocaleTag],
    limits: ModelLimits,
) -> Result<BatchPlan, PlanError> {
    let remaining = remaining_output_budget(prompt_tokens, limits)?;
    let plan = |batches| BatchPlan { prompt_tokens, source_tokens, remaining_budget: remaining, batches };

    if targets.is_empty() {
        return Ok(plan(Vec::new()));
    }

    let costs: Vec<(&LocaleTag, u64)> =
        targets.iter().map(|locale| (locale, estimated_cost(source_tokens, locale))).collect();

    if let Some((locale, estimated)) = costs.iter().max_by_key(|(_, cost)| *cost)
        && *estimated > remaining
    {
        return Err(PlanError::LocaleExceedsBudget {
            locale: (*locale).clone(),
            estimated: *estimated,
            remaining,
        });
    }

    let total = costs.iter().fold(0_u64, |total, (_, cost)| total.saturating_add(*cost));
    if total <= remaining {
        return Ok(plan(vec![targets.to_vec()]));
    }

    let average_multiplier =
        targets.iter().map(multiplier_for).sum::<u64>() / targets.len() as u64;
    let per_locale = source_tokens.max(1).saturating_mul(average_multiplier);
    let batch_size =
        usize::try_from(remaining.saturating_mul(PERMILLE) / per_locale).unwrap_or(usize::MAX);

    if batch_size < 1 {
        return Err(PlanError::ZeroBatchSize { remaining, source_tokens });
    }

    tracing::debug!(
        locales = targets.len(),
        batch_size,
        total_cost = total,
        remaining,
        "Splitting translation into batches"
    );

    Ok(plan(partition(targets, batch_size)))
}

/// Contiguous slices of `batch_size` locales; the last one may be shorter.
#[must_use]
pub fn partition(targets: &[LocaleTag], batch_size: usize) -> Vec<Vec<LocaleTag>> {
    targets.chunks(batch_size.max(1)).map(<[LocaleTag]>::to_vec).collect()
}
