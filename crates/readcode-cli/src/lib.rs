//! Coding sessions over free-text report tables.
//!
//! - [`session::Session`]: source table, rules, fallback and the last finalize
//! - [`script`]: the line-oriented operator command grammar
//! - [`settings`]: persisted defaults in `settings.toml`
//! - [`summary`]: terminal tables for rules, previews and coding counts

pub mod logging;
pub mod script;
pub mod session;
pub mod settings;
pub mod summary;
