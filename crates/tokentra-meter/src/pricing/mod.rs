//! Pricing module
//!
//! Maps (provider, model, token counts) to a cost breakdown:
//! - Static per-million-token rate table
//! - Exact, alias, then substring model lookup
//! - Fixed default rate when nothing matches

pub mod resolver;
pub mod table;

pub use resolver::{lookup, rate_for, resolve_cost};
pub use table::{ModelRate, ProviderRates, DEFAULT_RATE, MODEL_ALIASES, PRICING_TABLE};
