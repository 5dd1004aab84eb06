//! Domain layer: Core screening types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! All types are serializable; records are validated before use.

mod assessment;
mod choices;
pub mod classifier;
mod report;

pub use assessment::{check_field, Assessment, FieldCheck, RiskAssessmentRecord};
pub use choices::{
    AlcoholAmount, Answer, BiopsyReport, BmiCategory, Choice, Diet, Ethnicity, HormoneTherapyType,
};
pub use classifier::{classify, format_bmi, ClassifyError};
pub use report::{Priority, Recommendation, RiskBucket, RiskReport};

#[cfg(test)]
pub(crate) use assessment::fixtures;
