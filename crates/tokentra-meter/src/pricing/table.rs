//! Static model pricing, USD per 1M tokens.
//!
//! Row order matters: the substring fallback takes the first matching row.

/// Rates for one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRate {
    pub model: &'static str,
    pub input_per_1m: f64,
    pub output_per_1m: f64,
    /// Rate for cache-read prompt tokens, when the provider bills them separately
    pub cached_per_1m: Option<f64>,
}

/// All known models of one provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderRates {
    pub provider: &'static str,
    pub models: &'static [ModelRate],
}

const fn rate(model: &'static str, input_per_1m: f64, output_per_1m: f64) -> ModelRate {
    ModelRate {
        model,
        input_per_1m,
        output_per_1m,
        cached_per_1m: None,
    }
}

const fn cached_rate(
    model: &'static str,
    input_per_1m: f64,
    output_per_1m: f64,
    cached_per_1m: f64,
) -> ModelRate {
    ModelRate {
        model,
        input_per_1m,
        output_per_1m,
        cached_per_1m: Some(cached_per_1m),
    }
}

/// Applied when neither provider nor model is known
pub const DEFAULT_RATE: ModelRate = cached_rate("default", 1.0, 3.0, 0.1);

pub static PRICING_TABLE: &[ProviderRates] = &[
    ProviderRates {
        provider: "openai",
        models: &[
            rate("gpt-4", 30.0, 60.0),
            rate("gpt-4-turbo", 10.0, 30.0),
            rate("gpt-4o", 2.5, 10.0),
            rate("gpt-4o-mini", 0.15, 0.6),
            rate("gpt-3.5-turbo", 0.5, 1.5),
            rate("o1", 15.0, 60.0),
            rate("o1-mini", 3.0, 12.0),
            rate("o1-pro", 150.0, 600.0),
            rate("o3-mini", 1.1, 4.4),
        ],
    },
    ProviderRates {
        provider: "anthropic",
        models: &[
            cached_rate("claude-3-5-sonnet-20241022", 3.0, 15.0, 0.3),
            cached_rate("claude-3-5-haiku-20241022", 0.8, 4.0, 0.08),
            cached_rate("claude-3-opus-20240229", 15.0, 75.0, 1.5),
            cached_rate("claude-3-sonnet-20240229", 3.0, 15.0, 0.3),
            cached_rate("claude-3-haiku-20240307", 0.25, 1.25, 0.03),
        ],
    },
    ProviderRates {
        provider: "google",
        models: &[
            rate("gemini-2.0-flash", 0.1, 0.4),
            rate("gemini-1.5-pro", 1.25, 5.0),
            rate("gemini-1.5-flash", 0.075, 0.3),
        ],
    },
    ProviderRates {
        provider: "xai",
        models: &[rate("grok-2", 2.0, 10.0), rate("grok-2-mini", 0.2, 1.0)],
    },
    ProviderRates {
        provider: "deepseek",
        models: &[
            rate("deepseek-chat", 0.14, 0.28),
            rate("deepseek-reasoner", 0.55, 2.19),
        ],
    },
    ProviderRates {
        provider: "mistral",
        models: &[rate("mistral-large", 2.0, 6.0), rate("mistral-small", 0.2, 0.6)],
    },
    ProviderRates {
        provider: "cohere",
        models: &[rate("command-r-plus", 2.5, 10.0), rate("command-r", 0.15, 0.6)],
    },
    ProviderRates {
        provider: "groq",
        models: &[rate("llama-3.3-70b", 0.59, 0.79), rate("mixtral-8x7b", 0.24, 0.24)],
    },
];

/// Explicit (provider, alias, canonical model) mappings, checked before the
/// substring fallback so dated snapshots are not mispriced by a shorter prefix.
pub static MODEL_ALIASES: &[(&str, &str, &str)] = &[
    ("openai", "gpt-4o-2024-05-13", "gpt-4o"),
    ("openai", "gpt-4o-2024-08-06", "gpt-4o"),
    ("openai", "gpt-4o-2024-11-20", "gpt-4o"),
    ("openai", "chatgpt-4o-latest", "gpt-4o"),
    ("openai", "gpt-4o-mini-2024-07-18", "gpt-4o-mini"),
    ("openai", "gpt-4-turbo-2024-04-09", "gpt-4-turbo"),
    ("openai", "gpt-4-turbo-preview", "gpt-4-turbo"),
    ("openai", "gpt-3.5-turbo-0125", "gpt-3.5-turbo"),
    ("openai", "o1-2024-12-17", "o1"),
    ("openai", "o1-mini-2024-09-12", "o1-mini"),
    ("openai", "o3-mini-2025-01-31", "o3-mini"),
    ("anthropic", "claude-3-5-sonnet-latest", "claude-3-5-sonnet-20241022"),
    ("anthropic", "claude-3-5-haiku-latest", "claude-3-5-haiku-20241022"),
    ("anthropic", "claude-3-opus-latest", "claude-3-opus-20240229"),
];
