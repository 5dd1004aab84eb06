//! Screening service: record intake, lookup and risk reports.
//!
//! Every record passes through `RiskAssessmentRecord::prepare` before it is
//! stored or classified. Logs carry assessment ids only, never answers.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{classify, Assessment, BmiCategory, RiskAssessmentRecord, RiskReport};
use crate::ports::{AssessmentFilter, AssessmentPage, AssessmentStore};
use crate::OncoscreenError;

/// A stored assessment with its derived metrics and classification.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub assessment: Assessment,
    pub bmi: Option<f64>,
    pub bmi_category: Option<BmiCategory>,
    pub risk: RiskReport,
}

/// Service for submitting, editing and reporting on assessments.
pub struct ScreeningService<S>
where
    S: AssessmentStore,
{
    storage: Arc<S>,
}

impl<S> ScreeningService<S>
where
    S: AssessmentStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new screening service.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    fn storage_err(e: S::Error) -> OncoscreenError {
        OncoscreenError::Storage(e.into())
    }

    /// Validate, normalize and store a new questionnaire.
    ///
    /// # Errors
    /// Returns `Validation` with every message if the questionnaire is
    /// incomplete, or a storage error.
    pub fn submit(&self, record: RiskAssessmentRecord) -> Result<Assessment, OncoscreenError> {
        let record = record.prepare().map_err(OncoscreenError::Validation)?;
        let assessment = Assessment::new(record);

        self.storage
            .insert_assessment(&assessment)
            .map_err(Self::storage_err)?;

        tracing::info!("Stored assessment {}", assessment.id);
        Ok(assessment)
    }

    /// Replace the questionnaire of an existing assessment.
    ///
    /// The creation time is kept; `updated_at` is refreshed.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, `Validation` for an invalid
    /// questionnaire, or a storage error.
    pub fn update(
        &self,
        id: &str,
        record: RiskAssessmentRecord,
    ) -> Result<Assessment, OncoscreenError> {
        let mut assessment = self.get(id)?;
        assessment.record = record.prepare().map_err(OncoscreenError::Validation)?;
        assessment.updated_at = chrono::Utc::now().max(assessment.created_at);

        let updated = self
            .storage
            .update_assessment(&assessment)
            .map_err(Self::storage_err)?;
        if !updated {
            return Err(OncoscreenError::NotFound(id.to_string()));
        }

        tracing::info!("Updated assessment {}", assessment.id);
        Ok(assessment)
    }

    /// Delete an assessment.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn delete(&self, id: &str) -> Result<(), OncoscreenError> {
        let deleted = self
            .storage
            .delete_assessment(id)
            .map_err(Self::storage_err)?;
        if !deleted {
            return Err(OncoscreenError::NotFound(id.to_string()));
        }

        tracing::info!("Deleted assessment {}", id);
        Ok(())
    }

    /// Load one assessment.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn get(&self, id: &str) -> Result<Assessment, OncoscreenError> {
        self.storage
            .load_assessment(id)
            .map_err(Self::storage_err)?
            .ok_or_else(|| OncoscreenError::NotFound(id.to_string()))
    }

    /// Filtered page of assessments, newest first.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn list(
        &self,
        filter: &AssessmentFilter,
        offset: usize,
        limit: usize,
    ) -> Result<AssessmentPage, OncoscreenError> {
        self.storage
            .load_assessments_paginated(filter, offset, limit.max(1))
            .map_err(Self::storage_err)
    }

    /// The `limit` newest assessments.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<Assessment>, OncoscreenError> {
        self.storage
            .load_recent_assessments(limit)
            .map_err(Self::storage_err)
    }

    /// Every stored assessment, newest first.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn all(&self) -> Result<Vec<Assessment>, OncoscreenError> {
        self.storage.load_assessments().map_err(Self::storage_err)
    }

    /// Classify a stored assessment.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, a classification error if the
    /// stored record is missing answers, or a storage error.
    pub fn report(&self, id: &str) -> Result<AssessmentReport, OncoscreenError> {
        let assessment = self.get(id)?;
        let risk = classify(&assessment.record)?;

        tracing::debug!(
            "Classified assessment {}: {} factors, {} recommendations",
            assessment.id,
            risk.factor_count(),
            risk.recommendations.len()
        );

        Ok(AssessmentReport {
            bmi: assessment.record.bmi(),
            bmi_category: assessment.record.bmi_category(),
            assessment,
            risk,
        })
    }

    /// Validate and classify a questionnaire without storing it.
    ///
    /// # Errors
    /// Returns `Validation` for an invalid questionnaire.
    pub fn preview(&self, record: RiskAssessmentRecord) -> Result<RiskReport, OncoscreenError> {
        let record = record.prepare().map_err(OncoscreenError::Validation)?;
        Ok(classify(&record)?)
    }
}
