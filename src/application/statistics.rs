//! Statistics service: aggregate counts over stored assessments.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{Answer, Assessment, Choice, Ethnicity};
use crate::ports::AssessmentStore;
use crate::OncoscreenError;

/// Number of assessments shown on the dashboard.
const DASHBOARD_RECENT: usize = 5;

/// Window for `assessments_last_month`.
const RECENT_WINDOW_DAYS: i64 = 30;

/// Dashboard age bands: label and inclusive bounds (`None` = open-ended).
const AGE_GROUPS: [(&str, u32, Option<u32>); 5] = [
    ("20-29", 20, Some(29)),
    ("30-39", 30, Some(39)),
    ("40-49", 40, Some(49)),
    ("50-59", 50, Some(59)),
    ("60+", 60, None),
];

/// Count of assessments sharing one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionEntry {
    pub code: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FamilyHistoryCounts {
    pub female_family_history: usize,
    pub male_family_history: usize,
    pub personal_history: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentStatistics {
    pub total_assessments: usize,
    /// Created within the 30 days before the reference time
    pub assessments_last_month: usize,
    /// `None` when no stored assessment has an age
    pub avg_age: Option<f64>,
    pub gender_distribution: Vec<DistributionEntry>,
    pub ethnicity_distribution: Vec<DistributionEntry>,
    pub family_history: FamilyHistoryCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeGroupCount {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub recent_assessments: Vec<Assessment>,
    pub total_assessments: usize,
    /// BRCA positive, personal history, or more than one affected relative
    pub high_risk_count: usize,
    pub age_groups: Vec<AgeGroupCount>,
}

fn distribution<C: Choice>(values: impl Iterator<Item = Option<C>>) -> Vec<DistributionEntry> {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for value in values.flatten() {
        *counts.entry(value.code()).or_default() += 1;
    }

    C::ALL
        .iter()
        .filter_map(|choice| {
            counts.get(choice.code()).map(|&count| DistributionEntry {
                code: choice.code().to_string(),
                label: choice.label().to_string(),
                count,
            })
        })
        .collect()
}

fn count_yes(assessments: &[Assessment], field: fn(&Assessment) -> Option<Answer>) -> usize {
    assessments
        .iter()
        .filter(|a| field(a).is_some_and(Answer::is_yes))
        .count()
}

/// Service for aggregate statistics and the dashboard summary.
pub struct StatisticsService<S>
where
    S: AssessmentStore,
{
    storage: Arc<S>,
}

impl<S> StatisticsService<S>
where
    S: AssessmentStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new statistics service.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    fn load_all(&self) -> Result<Vec<Assessment>, OncoscreenError> {
        self.storage
            .load_assessments()
            .map_err(|e| OncoscreenError::Storage(e.into()))
    }

    /// Aggregate statistics relative to `now`.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn statistics(&self, now: DateTime<Utc>) -> Result<AssessmentStatistics, OncoscreenError> {
        let assessments = self.load_all()?;
        let since = now - Duration::days(RECENT_WINDOW_DAYS);

        let ages: Vec<u32> = assessments.iter().filter_map(|a| a.record.age).collect();
        let avg_age = (!ages.is_empty())
            .then(|| ages.iter().map(|&a| f64::from(a)).sum::<f64>() / ages.len() as f64);

        let stats = AssessmentStatistics {
            total_assessments: assessments.len(),
            assessments_last_month: assessments
                .iter()
                .filter(|a| a.created_at >= since)
                .count(),
            avg_age,
            gender_distribution: distribution::<Answer>(
                assessments.iter().map(|a| a.record.gender),
            ),
            ethnicity_distribution: distribution::<Ethnicity>(
                assessments.iter().map(|a| a.record.ethnicity),
            ),
            family_history: FamilyHistoryCounts {
                female_family_history: count_yes(&assessments, |a| a.record.family_history_female),
                male_family_history: count_yes(&assessments, |a| a.record.family_history_male),
                personal_history: count_yes(&assessments, |a| a.record.personal_history),
            },
        };

        tracing::debug!("Computed statistics over {} assessments", stats.total_assessments);
        Ok(stats)
    }

    /// Recent assessments, high-risk count and age bands.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn dashboard(&self) -> Result<Dashboard, OncoscreenError> {
        let assessments = self.load_all()?;

        let age_groups = AGE_GROUPS
            .iter()
            .map(|&(label, min, max)| AgeGroupCount {
                label,
                count: assessments
                    .iter()
                    .filter_map(|a| a.record.age)
                    .filter(|&age| age >= min && max.map_or(true, |max| age <= max))
                    .count(),
            })
            .collect();

        Ok(Dashboard {
            recent_assessments: assessments.iter().take(DASHBOARD_RECENT).cloned().collect(),
            total_assessments: assessments.len(),
            high_risk_count: assessments
                .iter()
                .filter(|a| a.record.has_high_risk_history())
                .count(),
            age_groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteStorage;
    use crate::domain::fixtures::baseline_record;
    use crate::domain::RiskAssessmentRecord;
    use chrono::TimeZone;

    fn seeded(records: Vec<(RiskAssessmentRecord, DateTime<Utc>)>) -> StatisticsService<SqliteStorage> {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        for (record, created_at) in records {
            storage
                .insert_assessment(&Assessment::created_at(record, created_at))
                .expect("Should save");
        }
        StatisticsService::new(storage)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_statistics() {
        let service = seeded(Vec::new());
        let stats = service.statistics(now()).expect("Should compute");
        assert_eq!(stats.total_assessments, 0);
        assert_eq!(stats.avg_age, None);
        assert!(stats.gender_distribution.is_empty());

        let dashboard = service.dashboard().expect("Should compute");
        assert_eq!(dashboard.high_risk_count, 0);
        assert!(dashboard.age_groups.iter().all(|g| g.count == 0));
    }

    #[test]
    fn test_statistics() {
        let service = seeded(vec![
            (
                RiskAssessmentRecord {
                    age: Some(30),
                    family_history_female: Some(Answer::Yes),
                    family_history_count: Some(1),
                    ..baseline_record()
                },
                now() - Duration::days(2),
            ),
            (
                RiskAssessmentRecord {
                    age: Some(50),
                    gender: Some(Answer::No),
                    ethnicity: Some(Ethnicity::Other),
                    ..baseline_record()
                },
                now() - Duration::days(45),
            ),
            (
                RiskAssessmentRecord {
                    age: Some(46),
                    personal_history: Some(Answer::Yes),
                    ..baseline_record()
                },
                now() - Duration::days(10),
            ),
        ]);

        let stats = service.statistics(now()).expect("Should compute");
        assert_eq!(stats.total_assessments, 3);
        assert_eq!(stats.assessments_last_month, 2);
        assert_eq!(stats.avg_age, Some(42.0));

        let genders: Vec<(&str, usize)> = stats
            .gender_distribution
            .iter()
            .map(|e| (e.code.as_str(), e.count))
            .collect();
        assert_eq!(genders, vec![("y", 2), ("n", 1)]);

        let ethnicities: Vec<(&str, usize)> = stats
            .ethnicity_distribution
            .iter()
            .map(|e| (e.label.as_str(), e.count))
            .collect();
        assert_eq!(ethnicities, vec![("White", 2), ("Other race or ethnicity", 1)]);

        assert_eq!(
            stats.family_history,
            FamilyHistoryCounts {
                female_family_history: 1,
                male_family_history: 0,
                personal_history: 1,
            }
        );
    }

    #[test]
    fn test_dashboard() {
        let mut records = Vec::new();
        for (i, age) in [19, 25, 33, 47, 59, 60, 88].into_iter().enumerate() {
            records.push((
                RiskAssessmentRecord {
                    age: Some(age),
                    ..baseline_record()
                },
                now() - Duration::days(i as i64),
            ));
        }
        records.push((
            RiskAssessmentRecord {
                age: Some(41),
                genetic_test: Some(Answer::Yes),
                genetic_test_result: Some(Answer::Yes),
                ..baseline_record()
            },
            now() - Duration::days(30),
        ));
        let service = seeded(records);

        let dashboard = service.dashboard().expect("Should compute");
        assert_eq!(dashboard.total_assessments, 8);
        assert_eq!(dashboard.high_risk_count, 1);
        assert_eq!(dashboard.recent_assessments.len(), 5);
        assert_eq!(dashboard.recent_assessments[0].record.age, Some(19));

        let groups: Vec<(&str, usize)> = dashboard
            .age_groups
            .iter()
            .map(|g| (g.label, g.count))
            .collect();
        assert_eq!(
            groups,
            vec![("20-29", 1), ("30-39", 1), ("40-49", 2), ("50-59", 1), ("60+", 2)]
        );
    }
}
