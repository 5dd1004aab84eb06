//! Storage port: Trait for persistent assessment storage.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Answer, Assessment, Ethnicity};

/// Default number of assessments per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Listing filter. Every criterion is optional and they combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssessmentFilter {
    /// Substring matched against the age or the ethnicity code
    pub search: Option<String>,
    /// Earliest creation date (inclusive)
    pub date_from: Option<NaiveDate>,
    /// Latest creation date (inclusive)
    pub date_to: Option<NaiveDate>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub ethnicity: Option<Ethnicity>,
    pub gender: Option<Answer>,
}

impl AssessmentFilter {
    /// Whether no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A page of assessments with pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentPage {
    /// Assessments in this page, newest first
    pub items: Vec<Assessment>,
    /// Number of assessments matching the filter
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl AssessmentPage {
    /// Create a new assessment page.
    #[must_use]
    pub fn new(items: Vec<Assessment>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset.saturating_add(items.len()) < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    /// Get the next page offset.
    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        self.has_more
            .then(|| self.offset.checked_add(self.limit))
            .flatten()
    }

    /// Get the previous page offset.
    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.limit))
    }
}

/// Trait for local assessment storage.
///
/// Implementations store records exactly as given; callers are expected to
/// pass records through `RiskAssessmentRecord::prepare` first.
pub trait AssessmentStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert a new assessment.
    ///
    /// # Errors
    /// Returns error if storage operation fails (including a duplicate id).
    fn insert_assessment(&self, assessment: &Assessment) -> Result<(), Self::Error>;

    /// Replace the record and `updated_at` of an existing assessment.
    ///
    /// # Returns
    /// `false` if no assessment has that id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn update_assessment(&self, assessment: &Assessment) -> Result<bool, Self::Error>;

    /// Load one assessment.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_assessment(&self, id: &str) -> Result<Option<Assessment>, Self::Error>;

    /// Load every assessment, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_assessments(&self) -> Result<Vec<Assessment>, Self::Error>;

    /// Load the `limit` newest assessments.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_recent_assessments(&self, limit: usize) -> Result<Vec<Assessment>, Self::Error>;

    /// Load a filtered page, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_assessments_paginated(
        &self,
        filter: &AssessmentFilter,
        offset: usize,
        limit: usize,
    ) -> Result<AssessmentPage, Self::Error>;

    /// Get the total count of assessments.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_assessments(&self) -> Result<usize, Self::Error>;

    /// Delete an assessment by ID.
    ///
    /// # Returns
    /// `false` if no assessment has that id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn delete_assessment(&self, id: &str) -> Result<bool, Self::Error>;

    /// Delete every assessment.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn clear_all(&self) -> Result<(), Self::Error>;
}
