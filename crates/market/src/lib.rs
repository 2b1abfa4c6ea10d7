//! Market trend analysis for the auction engine.
//!
//! Reports are derived, read-only views over price-point history; they are
//! always recomputed on demand and never persisted as authoritative state.

pub mod analyzer;

pub use analyzer::MarketAnalyzer;
