//! Risk report types produced by the classifier.

use serde::{Deserialize, Serialize};

/// Qualitative severity bucket for a contributing factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBucket {
    High,
    Moderate,
    Low,
    /// Lowers risk
    Protective,
}

impl RiskBucket {
    /// Section heading used by reports.
    #[must_use]
    pub fn heading(&self) -> &'static str {
        match self {
            Self::High => "High risk factors",
            Self::Moderate => "Moderate risk factors",
            Self::Low => "Low risk factors",
            Self::Protective => "Protective factors",
        }
    }
}

impl std::fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Low => write!(f, "LOW"),
            Self::Protective => write!(f, "PROTECTIVE"),
        }
    }
}

/// Recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Moderate,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Moderate => write!(f, "moderate"),
        }
    }
}

/// A single piece of advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub text: String,
    pub priority: Priority,
}

impl Recommendation {
    #[must_use]
    pub fn new(category: &str, text: &str, priority: Priority) -> Self {
        Self {
            category: category.to_string(),
            text: text.to_string(),
            priority,
        }
    }
}

/// Categorized risk factors and ranked recommendations for one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskReport {
    pub high_risk: Vec<String>,
    pub moderate_risk: Vec<String>,
    pub low_risk: Vec<String>,
    pub protective: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

impl RiskReport {
    /// Factor labels in one bucket.
    #[must_use]
    pub fn bucket(&self, bucket: RiskBucket) -> &[String] {
        match bucket {
            RiskBucket::High => &self.high_risk,
            RiskBucket::Moderate => &self.moderate_risk,
            RiskBucket::Low => &self.low_risk,
            RiskBucket::Protective => &self.protective,
        }
    }

    pub(crate) fn push_factor(&mut self, bucket: RiskBucket, label: String) {
        match bucket {
            RiskBucket::High => self.high_risk.push(label),
            RiskBucket::Moderate => self.moderate_risk.push(label),
            RiskBucket::Low => self.low_risk.push(label),
            RiskBucket::Protective => self.protective.push(label),
        }
    }

    /// Total number of factors across all buckets.
    #[must_use]
    pub fn factor_count(&self) -> usize {
        self.high_risk.len() + self.moderate_risk.len() + self.low_risk.len() + self.protective.len()
    }

    /// Most severe bucket with at least one factor, ignoring protective ones.
    #[must_use]
    pub fn highest_bucket(&self) -> Option<RiskBucket> {
        [RiskBucket::High, RiskBucket::Moderate, RiskBucket::Low]
            .into_iter()
            .find(|b| !self.bucket(*b).is_empty())
    }
}
