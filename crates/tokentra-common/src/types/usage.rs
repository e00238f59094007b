//! Token usage and cost value types

use serde::{Deserialize, Serialize};

/// Token counts reported by a provider for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Prompt tokens served from the provider's cache
    pub cached_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cached_tokens: 0,
        }
    }

    pub fn with_cached(mut self, cached_tokens: u64) -> Self {
        self.cached_tokens = cached_tokens;
        self
    }

    /// Input plus output; cached tokens are a subset of input and not added
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Priced usage, in currency units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub cached_cost: f64,
    pub total_cost: f64,
}

impl CostBreakdown {
    /// Build a breakdown; the total is always the sum of the parts
    pub fn new(input_cost: f64, output_cost: f64, cached_cost: f64) -> Self {
        Self {
            input_cost,
            output_cost,
            cached_cost,
            total_cost: input_cost + output_cost + cached_cost,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}
