//! # Oncoscreen
//!
//! Local breast cancer risk-factor screening.
//!
//! This crate provides:
//! - Questionnaire validation and normalization
//! - Rule-based classification into risk buckets with recommendations
//! - SQLite persistence, statistics and CSV export
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Questionnaire, choices, classifier and report types
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (SQLite, CSV, log sanitization)
//! - `application`: Use cases orchestrating domain and ports
//! - `cli`: Command-line front end

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{classify, Assessment, RiskAssessmentRecord, RiskReport};

/// Result type for Oncoscreen operations
pub type Result<T> = std::result::Result<T, OncoscreenError>;

/// Main error type for Oncoscreen
#[derive(Debug, thiserror::Error)]
pub enum OncoscreenError {
    #[error("Invalid assessment: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Classification failed: {0}")]
    Classify(#[from] domain::ClassifyError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Export failed: {0}")]
    Export(#[from] adapters::ExportError),

    #[error("Assessment not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
