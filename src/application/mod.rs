//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod screening;
mod statistics;

pub use screening::{AssessmentReport, ScreeningService};
pub use statistics::{
    AgeGroupCount, AssessmentStatistics, Dashboard, DistributionEntry, FamilyHistoryCounts,
    StatisticsService,
};
