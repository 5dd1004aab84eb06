//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (storage).

mod storage;

pub use storage::{AssessmentFilter, AssessmentPage, AssessmentStore, DEFAULT_PAGE_SIZE};
