//! Iron Grind — a persistent multi-actor virtual economy engine.
//!
//! Accounts earn coins through timed tool lifts, level their tool through a
//! 20-step catalog, buy and upgrade revenue-generating businesses, and pool
//! resources into group treasuries. The engine exposes one typed operation
//! per player or operator intent; command parsing, transport, and text
//! formatting live in whatever front end embeds this crate.

pub mod admin;
pub mod business;
pub mod clock;
pub mod config;
pub mod confirm;
pub mod engine;
pub mod error;
pub mod progression;
pub mod promo;
pub mod store;
pub mod treasury;
pub mod types;
