//! ReviewForge Common Library
//!
//! Shared code for the ReviewForge screening pipeline including:
//! - Screened-paper record models and the snapshot normalization boundary
//! - Identity resolution for cross-query deduplication
//! - Error types and handling
//! - Configuration management

pub mod config;
pub mod errors;
pub mod identity;
pub mod models;

// Re-export commonly used types
pub use config::ReviewConfig;
pub use errors::{AppError, Result};
pub use identity::IdentityKey;
pub use models::{Decision, MergeSummary, MergedPaper, ScreenedPaper};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
