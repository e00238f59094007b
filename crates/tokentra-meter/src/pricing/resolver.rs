//! Cost resolution
//!
//! Lookup order for a (provider, model) pair:
//! 1. exact model name under the lower-cased provider
//! 2. explicit alias table
//! 3. first table row whose name contains, or is contained in, the requested model
//!    (an empty model is contained in every name, so it takes the provider's first row)
//! 4. [`DEFAULT_RATE`]
//!
//! Resolution never fails; unknown models degrade to the default rate.

use super::table::{ModelRate, ProviderRates, DEFAULT_RATE, MODEL_ALIASES, PRICING_TABLE};
use tokentra_common::{CostBreakdown, TokenUsage};

const TOKENS_PER_UNIT: f64 = 1_000_000.0;

fn provider_rates(provider: &str) -> Option<&'static ProviderRates> {
    let provider = provider.to_lowercase();
    PRICING_TABLE.iter().find(|p| p.provider == provider)
}

/// Find the table row for a model, if any
pub fn lookup(provider: &str, model: &str) -> Option<&'static ModelRate> {
    let rates = provider_rates(provider)?;

    if let Some(exact) = rates.models.iter().find(|m| m.model == model) {
        return Some(exact);
    }

    let requested = model.to_lowercase();

    if let Some((_, _, canonical)) = MODEL_ALIASES
        .iter()
        .find(|(p, alias, _)| *p == rates.provider && *alias == requested)
    {
        return rates.models.iter().find(|m| m.model == *canonical);
    }

    rates
        .models
        .iter()
        .find(|m| requested.contains(m.model) || m.model.contains(requested.as_str()))
}

/// Rate applied to a model, falling back to [`DEFAULT_RATE`]
pub fn rate_for(provider: &str, model: &str) -> ModelRate {
    lookup(provider, model).copied().unwrap_or(DEFAULT_RATE)
}

/// Price a call's token usage
pub fn resolve_cost(provider: &str, model: &str, usage: TokenUsage) -> CostBreakdown {
    let rate = rate_for(provider, model);

    let input_cost = usage.input_tokens as f64 / TOKENS_PER_UNIT * rate.input_per_1m;
    let output_cost = usage.output_tokens as f64 / TOKENS_PER_UNIT * rate.output_per_1m;
    let cached_cost = match rate.cached_per_1m {
        Some(cached_rate) if usage.cached_tokens > 0 => {
            usage.cached_tokens as f64 / TOKENS_PER_UNIT * cached_rate
        }
        _ => 0.0,
    };

    CostBreakdown::new(input_cost, output_cost, cached_cost)
}
