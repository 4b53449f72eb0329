//! Parameter guideline catalog and reading evaluation.
//!
//! This module provides the TOML-driven guideline tables a milking-system
//! audit measures against, and classifies individual readings into
//! Low / Normal / High / Critical with remediation recommendations.
//!
//! # Architecture
//!
//! - **Catalog**: Loaded from TOML at startup (or the embedded standard set)
//! - **Evaluation**: Parameter name + reading -> status classification
//! - **Recommendations**: Remediation steps plus a status-specific note
//!
//! # Example
//!
//! ```ignore
//! use parloraudit::guidelines::{GuidelineCatalog, ParameterStatus};
//!
//! let catalog = GuidelineCatalog::standard();
//!
//! let status = catalog.evaluate("Claw Vacuum", 11.9);
//! assert_eq!(status, ParameterStatus::Low);
//!
//! for step in catalog.recommendations("Claw Vacuum", 11.9) {
//!     println!("- {}", step);
//! }
//! ```

mod catalog;
mod engine;
mod types;

pub use catalog::{default_guidelines, load_guidelines};
pub use engine::GuidelineCatalog;
pub use types::*;
