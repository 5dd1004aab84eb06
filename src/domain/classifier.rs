//! Breast cancer risk-factor classifier.
//!
//! [`classify`] turns one questionnaire into a [`RiskReport`]. It is a pure
//! function: no I/O, no logging, and the record is only borrowed.
//!
//! The logic is two ordered rule tables. Each factor rule contributes at
//! most one label to one bucket; each recommendation rule contributes zero
//! or more recommendations. Table order fixes the order of the output lists.
//!
//! A rule that needs an answer to pick its branch fails with
//! [`ClassifyError::InvalidInput`] when that answer is missing. Nothing is
//! defaulted. BMI is the exception: it is optional, and the BMI rules are
//! skipped when weight or height is absent.

use super::assessment::RiskAssessmentRecord;
use super::choices::{AlcoholAmount, Answer, Diet, HormoneTherapyType};
use super::report::{Priority, Recommendation, RiskBucket, RiskReport};

/// Classification failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("Invalid input: rule '{rule}' requires '{field}'")]
    InvalidInput {
        field: &'static str,
        rule: &'static str,
    },
}

/// Record plus values derived once per classification.
struct Inputs<'a> {
    record: &'a RiskAssessmentRecord,
    bmi: Option<f64>,
}

impl<'a> Inputs<'a> {
    fn new(record: &'a RiskAssessmentRecord) -> Self {
        Self {
            record,
            bmi: record.bmi(),
        }
    }
}

type RuleResult<T> = Result<T, ClassifyError>;

fn required<T: Copy>(value: Option<T>, field: &'static str, rule: &'static str) -> RuleResult<T> {
    value.ok_or(ClassifyError::InvalidInput { field, rule })
}

fn yes(value: Option<Answer>, field: &'static str, rule: &'static str) -> RuleResult<bool> {
    required(value, field, rule).map(Answer::is_yes)
}

/// Conditional answer, read only when the parent is yes. A missing parent
/// counts as "not asked".
fn when_yes<T: Copy>(
    parent: Option<Answer>,
    child: Option<T>,
    field: &'static str,
    rule: &'static str,
) -> RuleResult<Option<T>> {
    if parent.is_some_and(Answer::is_yes) {
        required(child, field, rule).map(Some)
    } else {
        Ok(None)
    }
}

/// Render a rounded BMI the way the form displays it: shortest decimal with
/// at least one fractional digit.
#[must_use]
pub fn format_bmi(bmi: f64) -> String {
    let text = bmi.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

type Factor = Option<(RiskBucket, String)>;

fn factor(bucket: RiskBucket, label: &str) -> Factor {
    Some((bucket, label.to_string()))
}

/// Predicate/effect pair contributing at most one risk factor.
struct FactorRule {
    name: &'static str,
    apply: fn(&Inputs<'_>, &'static str) -> RuleResult<Factor>,
}

/// Predicate/effect pair contributing recommendations.
struct RecommendationRule {
    name: &'static str,
    apply: fn(&Inputs<'_>, &'static str) -> RuleResult<Vec<Recommendation>>,
}

const FACTOR_RULES: &[FactorRule] = &[
    FactorRule {
        name: "age",
        apply: |i, rule| {
            let age = required(i.record.age, "age", rule)?;
            Ok(if age >= 65 {
                factor(RiskBucket::High, "Age 65 or older")
            } else if age >= 50 {
                factor(RiskBucket::Moderate, "Age 50-64")
            } else {
                None
            })
        },
    },
    FactorRule {
        name: "gender",
        apply: |i, rule| {
            Ok(yes(i.record.gender, "gender", rule)?
                .then(|| (RiskBucket::Moderate, "Female gender".to_string())))
        },
    },
    FactorRule {
        name: "family_history_female",
        apply: |i, rule| {
            if !yes(i.record.family_history_female, "family_history_female", rule)? {
                return Ok(None);
            }
            // A missing count falls to the single-relative branch.
            Ok(match i.record.family_history_count {
                Some(count) if count > 1 => Some((
                    RiskBucket::High,
                    format!("Multiple female relatives with breast cancer ({count})"),
                )),
                _ => factor(
                    RiskBucket::Moderate,
                    "Family history of breast cancer (female relatives)",
                ),
            })
        },
    },
    FactorRule {
        name: "family_history_male",
        apply: |i, rule| {
            Ok(yes(i.record.family_history_male, "family_history_male", rule)?.then(|| {
                (
                    RiskBucket::Moderate,
                    "Family history of breast cancer (male relatives)".to_string(),
                )
            }))
        },
    },
    FactorRule {
        name: "personal_history",
        apply: |i, rule| {
            Ok(yes(i.record.personal_history, "personal_history", rule)?
                .then(|| (RiskBucket::High, "Personal history of breast cancer".to_string())))
        },
    },
    FactorRule {
        name: "genetic_test_result",
        apply: |i, rule| {
            let result = when_yes(
                i.record.genetic_test,
                i.record.genetic_test_result,
                "genetic_test_result",
                rule,
            )?;
            Ok(result
                .is_some_and(Answer::is_yes)
                .then(|| (RiskBucket::High, "BRCA1/BRCA2 mutation positive".to_string())))
        },
    },
    FactorRule {
        name: "menstrual_start",
        apply: |i, rule| {
            Ok(yes(i.record.menstrual_start, "menstrual_start", rule)?
                .then(|| (RiskBucket::Moderate, "Early menarche (before age 12)".to_string())))
        },
    },
    FactorRule {
        name: "menopause_age",
        apply: |i, rule| {
            Ok(yes(i.record.menopause_age, "menopause_age", rule)?
                .then(|| (RiskBucket::Moderate, "Late menopause (after age 55)".to_string())))
        },
    },
    FactorRule {
        name: "children_before_30",
        apply: |i, rule| {
            Ok((!yes(i.record.children_before_30, "children_before_30", rule)?)
                .then(|| (RiskBucket::Moderate, "No children before age 30".to_string())))
        },
    },
    FactorRule {
        name: "breastfeeding",
        apply: |i, rule| {
            Ok(yes(i.record.breastfeeding, "breastfeeding", rule)?.then(|| {
                (
                    RiskBucket::Protective,
                    "Breastfeeding for a year or more".to_string(),
                )
            }))
        },
    },
    FactorRule {
        name: "physical_activity",
        apply: |i, rule| {
            Ok(yes(i.record.physical_activity, "physical_activity", rule)?
                .then(|| (RiskBucket::Protective, "Regular physical activity".to_string())))
        },
    },
    FactorRule {
        name: "alcohol",
        apply: |i, rule| {
            if !yes(i.record.alcohol, "alcohol", rule)? {
                return Ok(None);
            }
            Ok(
                match required(i.record.alcohol_amount, "alcohol_amount", rule)? {
                    AlcoholAmount::TwoOrMore => factor(
                        RiskBucket::Moderate,
                        "Heavy alcohol consumption (2+ drinks daily)",
                    ),
                    AlcoholAmount::OneDrink => factor(
                        RiskBucket::Low,
                        "Moderate alcohol consumption (1 drink daily)",
                    ),
                },
            )
        },
    },
    FactorRule {
        name: "smoking",
        apply: |i, rule| {
            if !yes(i.record.smoking, "smoking", rule)? {
                return Ok(None);
            }
            Ok(if yes(i.record.smoking_timing, "smoking_timing", rule)? {
                factor(
                    RiskBucket::Moderate,
                    "Heavy smoking started before first pregnancy",
                )
            } else {
                factor(RiskBucket::Low, "Heavy smoking (20+ cigarettes/day)")
            })
        },
    },
    FactorRule {
        name: "bmi",
        apply: |i, _rule| {
            Ok(match i.bmi {
                Some(bmi) if bmi >= 30.0 => Some((
                    RiskBucket::Moderate,
                    format!("Obesity (BMI: {})", format_bmi(bmi)),
                )),
                Some(bmi) if bmi >= 25.0 => Some((
                    RiskBucket::Low,
                    format!("Overweight (BMI: {})", format_bmi(bmi)),
                )),
                _ => None,
            })
        },
    },
    FactorRule {
        name: "dense_breast",
        apply: |i, rule| {
            Ok(yes(i.record.dense_breast, "dense_breast", rule)?
                .then(|| (RiskBucket::Moderate, "Dense breast tissue".to_string())))
        },
    },
    FactorRule {
        name: "radiation_therapy",
        apply: |i, rule| {
            Ok(yes(i.record.radiation_therapy, "radiation_therapy", rule)?
                .then(|| (RiskBucket::Moderate, "Previous chest radiation therapy".to_string())))
        },
    },
    FactorRule {
        name: "hormone_therapy",
        apply: |i, rule| {
            if !yes(i.record.hormone_therapy, "hormone_therapy", rule)? {
                return Ok(None);
            }
            Ok(
                match required(i.record.hormone_therapy_type, "hormone_therapy_type", rule)? {
                    HormoneTherapyType::Combined => factor(
                        RiskBucket::Moderate,
                        "Combined hormone therapy (Estrogen + Progesterone)",
                    ),
                    HormoneTherapyType::EstrogenOnly => {
                        factor(RiskBucket::Low, "Estrogen replacement therapy")
                    }
                },
            )
        },
    },
    FactorRule {
        name: "biopsy_report",
        apply: |i, rule| {
            let report = when_yes(
                i.record.breast_biopsy,
                i.record.biopsy_report,
                "biopsy_report",
                rule,
            )?;
            Ok(match report {
                Some(r) if r.is_atypical() => {
                    factor(RiskBucket::High, "Atypical hyperplasia or LCIS on biopsy")
                }
                Some(r) if r.is_proliferative_without_atypia() => factor(
                    RiskBucket::Moderate,
                    "Proliferative breast lesions without atypia",
                ),
                _ => None,
            })
        },
    },
];

const RECOMMENDATION_RULES: &[RecommendationRule] = &[
    RecommendationRule {
        name: "screening",
        apply: |i, rule| {
            let age = required(i.record.age, "age", rule)?;
            Ok(if age >= 50 {
                vec![Recommendation::new(
                    "Screening",
                    "Annual mammography screening is recommended",
                    Priority::High,
                )]
            } else if age >= 40 {
                vec![Recommendation::new(
                    "Screening",
                    "Discuss mammography screening options with your doctor",
                    Priority::Moderate,
                )]
            } else {
                Vec::new()
            })
        },
    },
    RecommendationRule {
        name: "high_risk_management",
        apply: |i, rule| {
            let brca = when_yes(
                i.record.genetic_test,
                i.record.genetic_test_result,
                "genetic_test_result",
                rule,
            )?
            .is_some_and(Answer::is_yes);
            let personal = yes(i.record.personal_history, "personal_history", rule)?;
            let multiple_relatives =
                yes(i.record.family_history_female, "family_history_female", rule)?
                    && i.record.family_history_count.is_some_and(|count| count > 1);

            Ok(if brca || personal || multiple_relatives {
                vec![
                    Recommendation::new(
                        "High-Risk Management",
                        "Consider consultation with a breast specialist or genetic counselor",
                        Priority::High,
                    ),
                    Recommendation::new(
                        "Enhanced Screening",
                        "May benefit from MRI screening in addition to mammography",
                        Priority::High,
                    ),
                ]
            } else {
                Vec::new()
            })
        },
    },
    RecommendationRule {
        name: "physical_activity",
        apply: |i, rule| {
            Ok(if yes(i.record.physical_activity, "physical_activity", rule)? {
                Vec::new()
            } else {
                vec![Recommendation::new(
                    "Lifestyle",
                    "Increase physical activity to 150-300 minutes of moderate exercise weekly",
                    Priority::Moderate,
                )]
            })
        },
    },
    RecommendationRule {
        name: "alcohol",
        apply: |i, rule| {
            Ok(if yes(i.record.alcohol, "alcohol", rule)? {
                vec![Recommendation::new(
                    "Lifestyle",
                    "Consider limiting alcohol consumption to reduce breast cancer risk",
                    Priority::Moderate,
                )]
            } else {
                Vec::new()
            })
        },
    },
    RecommendationRule {
        name: "smoking",
        apply: |i, rule| {
            Ok(if yes(i.record.smoking, "smoking", rule)? {
                vec![Recommendation::new(
                    "Lifestyle",
                    "Smoking cessation is strongly recommended",
                    Priority::High,
                )]
            } else {
                Vec::new()
            })
        },
    },
    RecommendationRule {
        name: "weight_management",
        apply: |i, _rule| {
            Ok(match i.bmi {
                Some(bmi) if bmi >= 25.0 => vec![Recommendation::new(
                    "Weight Management",
                    "Maintain a healthy weight through diet and exercise",
                    Priority::Moderate,
                )],
                _ => Vec::new(),
            })
        },
    },
    RecommendationRule {
        name: "diet",
        apply: |i, rule| {
            Ok(if required(i.record.diet, "diet", rule)? == Diet::HighFat {
                vec![Recommendation::new(
                    "Diet",
                    "Consider adopting a diet rich in fruits, vegetables, and whole grains",
                    Priority::Moderate,
                )]
            } else {
                Vec::new()
            })
        },
    },
];

/// Classify one questionnaire.
///
/// # Errors
/// Returns [`ClassifyError::InvalidInput`] when an answer a rule needs is
/// missing. No partial report is produced.
pub fn classify(record: &RiskAssessmentRecord) -> Result<RiskReport, ClassifyError> {
    let inputs = Inputs::new(record);
    let mut report = RiskReport::default();

    for rule in FACTOR_RULES {
        if let Some((bucket, label)) = (rule.apply)(&inputs, rule.name)? {
            report.push_factor(bucket, label);
        }
    }

    for rule in RECOMMENDATION_RULES {
        report
            .recommendations
            .extend((rule.apply)(&inputs, rule.name)?);
    }

    Ok(report)
}
