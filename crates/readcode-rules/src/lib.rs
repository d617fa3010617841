//! Rule-based coding engine.
//!
//! - [`RuleStore`]: phrases grouped by code, replayed in global entry order
//! - [`MatchEngine`]: case-insensitive substring matching, last rule wins
//! - [`apply_fallback`]: zero or missing fill for unmatched records
//! - [`finalize`]: the full pass from source table to labeled table

pub mod engine;
pub mod fallback;
pub mod finalize;
pub mod store;

pub use engine::{MatchEngine, MatchOutcome};
pub use fallback::apply_fallback;
pub use finalize::{Finalized, finalize};
pub use store::{CodeGroup, Rule, RuleStore};
