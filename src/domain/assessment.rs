//! Breast cancer risk assessment questionnaire.
//!
//! A [`RiskAssessmentRecord`] is one completed questionnaire. All fields are
//! optional at the type level; [`RiskAssessmentRecord::prepare`] is the gate
//! that checks required answers and clears stale conditional answers before a
//! record is stored or classified.

use serde::{Deserialize, Serialize};

use super::choices::{
    AlcoholAmount, Answer, BiopsyReport, BmiCategory, Choice, Diet, Ethnicity, HormoneTherapyType,
};

/// Upper bound accepted for weight (kg) and height (cm).
const MAX_BODY_METRIC: f64 = 999.0;

/// Plausible BMI window for the form-wide sanity check.
const BMI_SANITY_RANGE: std::ops::RangeInclusive<f64> = 10.0..=60.0;

/// One completed questionnaire.
///
/// Conditional answers (`alcohol_amount`, `hormone_therapy_type`,
/// `biopsy_report`, `family_history_count`, `genetic_test_result`,
/// `smoking_timing`) are only meaningful when their parent answer is yes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessmentRecord {
    // Basic information
    /// Age in years (1-120)
    pub age: Option<u32>,
    /// "Are you a woman?"
    pub gender: Option<Answer>,
    pub ethnicity: Option<Ethnicity>,

    // Lifestyle
    /// Drinks alcohol every day
    pub alcohol: Option<Answer>,
    pub alcohol_amount: Option<AlcoholAmount>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    /// Height in centimeters
    pub height: Option<f64>,
    pub physical_activity: Option<Answer>,

    // Reproductive history
    pub children_before_30: Option<Answer>,
    /// Breastfeeding that lasted a year or more
    pub breastfeeding: Option<Answer>,
    pub birth_control: Option<Answer>,
    /// Post-menopausal hormone therapy
    pub hormone_therapy: Option<Answer>,
    pub hormone_therapy_type: Option<HormoneTherapyType>,
    /// Menstrual periods started before age 12
    pub menstrual_start: Option<Answer>,
    /// Menopause after age 55
    pub menopause_age: Option<Answer>,

    // Medical history
    pub breast_implants: Option<Answer>,
    /// Radiation therapy to the chest for another cancer
    pub radiation_therapy: Option<Answer>,
    /// Dense breast tissue reported on a mammogram
    pub dense_breast: Option<Answer>,
    /// Diethylstilbestrol exposure
    pub des_exposure: Option<Answer>,
    /// Breast biopsy for a reason other than cancer
    pub breast_biopsy: Option<Answer>,
    pub biopsy_report: Option<BiopsyReport>,

    // Family history
    /// Breast cancer in mother, sister or daughter
    pub family_history_female: Option<Answer>,
    pub family_history_count: Option<u32>,
    /// Breast cancer in father or brother
    pub family_history_male: Option<Answer>,
    /// Breast cancer in one breast
    pub personal_history: Option<Answer>,

    /// Taller than 170 cm
    pub tall: Option<Answer>,

    // Genetic testing
    /// Tested for BRCA1/BRCA2 mutations
    pub genetic_test: Option<Answer>,
    /// Positive for BRCA1 or BRCA2
    pub genetic_test_result: Option<Answer>,

    // Diet and lifestyle
    pub diet: Option<Diet>,
    /// 20 or more cigarettes per day
    pub smoking: Option<Answer>,
    /// Began smoking before the first pregnancy
    pub smoking_timing: Option<Answer>,
    pub night_shift: Option<Answer>,

    // Environmental beliefs
    pub chemicals_environment: Option<Answer>,
    /// Antiperspirants, bras or abortion believed to be risk factors
    pub controversial_factors: Option<Answer>,
}

fn is_yes(answer: Option<Answer>) -> bool {
    answer.is_some_and(Answer::is_yes)
}

fn require<T>(errors: &mut Vec<String>, field: &str, value: &Option<T>) {
    if value.is_none() {
        errors.push(format!("{field}: This field is required."));
    }
}

impl RiskAssessmentRecord {
    /// Body mass index rounded to two decimals.
    ///
    /// `None` when weight or height is missing or not positive.
    #[must_use]
    pub fn bmi(&self) -> Option<f64> {
        self.raw_bmi().map(|bmi| (bmi * 100.0).round() / 100.0)
    }

    fn raw_bmi(&self) -> Option<f64> {
        match (self.weight, self.height) {
            (Some(weight), Some(height)) if weight > 0.0 && height > 0.0 => {
                let height_m = height / 100.0;
                Some(weight / (height_m * height_m))
            }
            _ => None,
        }
    }

    /// BMI band derived from the rounded BMI.
    #[must_use]
    pub fn bmi_category(&self) -> Option<BmiCategory> {
        self.bmi().map(BmiCategory::from_bmi)
    }

    /// Clear every conditional answer whose parent is not yes.
    ///
    /// Protects against stale values left behind by partial edits.
    pub fn normalize(&mut self) {
        if !is_yes(self.alcohol) {
            self.alcohol_amount = None;
        }
        if !is_yes(self.hormone_therapy) {
            self.hormone_therapy_type = None;
        }
        if !is_yes(self.breast_biopsy) {
            self.biopsy_report = None;
        }
        if !is_yes(self.family_history_female) {
            self.family_history_count = None;
        }
        if !is_yes(self.genetic_test) {
            self.genetic_test_result = None;
        }
        if !is_yes(self.smoking) {
            self.smoking_timing = None;
        }
    }

    /// Whether no conditional answer is set without an affirmative parent.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        (is_yes(self.alcohol) || self.alcohol_amount.is_none())
            && (is_yes(self.hormone_therapy) || self.hormone_therapy_type.is_none())
            && (is_yes(self.breast_biopsy) || self.biopsy_report.is_none())
            && (is_yes(self.family_history_female) || self.family_history_count.is_none())
            && (is_yes(self.genetic_test) || self.genetic_test_result.is_none())
            && (is_yes(self.smoking) || self.smoking_timing.is_none())
    }

    /// Validate the questionnaire.
    ///
    /// # Errors
    /// Returns every validation message found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        require(&mut errors, "age", &self.age);
        require(&mut errors, "gender", &self.gender);
        require(&mut errors, "ethnicity", &self.ethnicity);
        require(&mut errors, "alcohol", &self.alcohol);
        require(&mut errors, "physical_activity", &self.physical_activity);
        require(&mut errors, "children_before_30", &self.children_before_30);
        require(&mut errors, "breastfeeding", &self.breastfeeding);
        require(&mut errors, "birth_control", &self.birth_control);
        require(&mut errors, "hormone_therapy", &self.hormone_therapy);
        require(&mut errors, "menstrual_start", &self.menstrual_start);
        require(&mut errors, "menopause_age", &self.menopause_age);
        require(&mut errors, "breast_implants", &self.breast_implants);
        require(&mut errors, "radiation_therapy", &self.radiation_therapy);
        require(&mut errors, "dense_breast", &self.dense_breast);
        require(&mut errors, "des_exposure", &self.des_exposure);
        require(&mut errors, "breast_biopsy", &self.breast_biopsy);
        require(&mut errors, "family_history_female", &self.family_history_female);
        require(&mut errors, "family_history_male", &self.family_history_male);
        require(&mut errors, "personal_history", &self.personal_history);
        require(&mut errors, "tall", &self.tall);
        require(&mut errors, "genetic_test", &self.genetic_test);
        require(&mut errors, "diet", &self.diet);
        require(&mut errors, "smoking", &self.smoking);
        require(&mut errors, "night_shift", &self.night_shift);
        require(&mut errors, "chemicals_environment", &self.chemicals_environment);
        require(&mut errors, "controversial_factors", &self.controversial_factors);

        if let Some(age) = self.age {
            errors.extend(age_errors(i64::from(age)));
        }
        if let Some(weight) = self.weight {
            errors.extend(body_metric_errors("weight", weight));
        }
        if let Some(height) = self.height {
            errors.extend(body_metric_errors("height", height));
        }

        if is_yes(self.family_history_female) {
            match self.family_history_count {
                None => errors.push(
                    "family_history_count: Please specify how many family members have had breast cancer."
                        .to_string(),
                ),
                Some(0) => errors.push("family_history_count: Count must be at least 1.".to_string()),
                Some(_) => {}
            }
        }
        if is_yes(self.alcohol) && self.alcohol_amount.is_none() {
            errors.push(
                "alcohol_amount: Please specify your daily alcohol consumption amount.".to_string(),
            );
        }
        if is_yes(self.hormone_therapy) && self.hormone_therapy_type.is_none() {
            errors.push(
                "hormone_therapy_type: Please specify the type of hormone therapy.".to_string(),
            );
        }
        if is_yes(self.breast_biopsy) && self.biopsy_report.is_none() {
            errors.push(
                "biopsy_report: Please select what was mentioned in your biopsy report."
                    .to_string(),
            );
        }
        if is_yes(self.genetic_test) && self.genetic_test_result.is_none() {
            errors.push(
                "genetic_test_result: Please specify your genetic test result.".to_string(),
            );
        }
        if is_yes(self.smoking) && self.smoking_timing.is_none() {
            errors.push("smoking_timing: Please specify when you began smoking.".to_string());
        }

        if let Some(bmi) = self.raw_bmi() {
            if !BMI_SANITY_RANGE.contains(&bmi) {
                errors.push(
                    "The calculated BMI seems unusual. Please check your weight and height values."
                        .to_string(),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, then normalize. The only way records should enter storage.
    ///
    /// # Errors
    /// Returns validation messages when the questionnaire is incomplete or
    /// out of range.
    pub fn prepare(mut self) -> Result<Self, Vec<String>> {
        self.validate()?;
        self.normalize();
        Ok(self)
    }

    /// BRCA positive, personal history, or more than one affected
    /// female relative.
    #[must_use]
    pub fn has_high_risk_history(&self) -> bool {
        is_yes(self.genetic_test_result)
            || is_yes(self.personal_history)
            || (is_yes(self.family_history_female)
                && self.family_history_count.is_some_and(|count| count > 1))
    }
}

fn age_errors(age: i64) -> Option<String> {
    if (1..=120).contains(&age) {
        None
    } else {
        Some("age: Age must be between 1 and 120 years.".to_string())
    }
}

fn body_metric_errors(field: &str, value: f64) -> Option<String> {
    let name = if field == "weight" { "Weight" } else { "Height" };
    if value.is_nan() || value <= 0.0 {
        Some(format!("{field}: {name} must be greater than 0."))
    } else if value > MAX_BODY_METRIC {
        Some(format!("{field}: Please enter a valid {field}."))
    } else {
        None
    }
}

/// Outcome of validating a single raw form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Validate one raw field value as typed into the form.
///
/// Only `age`, `weight` and `height` are checked; any other field name is
/// reported valid.
#[must_use]
pub fn check_field(field: &str, raw: &str) -> FieldCheck {
    let raw = raw.trim();
    let mut errors = Vec::new();

    match field {
        "age" => match raw.parse::<i64>() {
            Ok(age) if (1..=120).contains(&age) => {}
            Ok(_) => errors.push("Age must be between 1 and 120 years".to_string()),
            Err(_) => errors.push("Please enter a valid age".to_string()),
        },
        "weight" | "height" => match raw.parse::<f64>() {
            Ok(value) if value > 0.0 => {}
            Ok(_) if field == "weight" => errors.push("Weight must be greater than 0".to_string()),
            Ok(_) => errors.push("Height must be greater than 0".to_string()),
            Err(_) => errors.push(format!("Please enter a valid {field}")),
        },
        _ => {}
    }

    FieldCheck {
        valid: errors.is_empty(),
        errors,
    }
}

/// A stored assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique identifier
    pub id: String,

    /// The normalized questionnaire
    pub record: RiskAssessmentRecord,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Assessment {
    /// Wrap a prepared record with a fresh id and timestamps.
    #[must_use]
    pub fn new(record: RiskAssessmentRecord) -> Self {
        Self::created_at(record, chrono::Utc::now())
    }

    /// Wrap a prepared record with an explicit creation time.
    #[must_use]
    pub fn created_at(
        record: RiskAssessmentRecord,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: new_assessment_id(),
            record,
            created_at,
            updated_at: created_at,
        }
    }
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let gender = self.record.gender.map_or("Unknown", |g| g.label());
        match self.record.age {
            Some(age) => write!(
                f,
                "Assessment for {gender} aged {age} - {}",
                self.created_at.format("%Y-%m-%d")
            ),
            None => write!(
                f,
                "Assessment for {gender} - {}",
                self.created_at.format("%Y-%m-%d")
            ),
        }
    }
}

/// Random (v4) UUID string from a ChaCha20 CSPRNG seeded by the OS.
fn new_assessment_id() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let mut bytes: [u8; 16] = rng.gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}


#[cfg(test)]
mod tests {
    use super::fixtures::baseline_record;
    use super::*;

    #[test]
    fn test_bmi_and_category() {
        let record = RiskAssessmentRecord {
            weight: Some(70.0),
            height: Some(175.0),
            ..Default::default()
        };
        assert_eq!(record.bmi(), Some(22.86));
        assert_eq!(record.bmi_category(), Some(BmiCategory::NormalWeight));

        let record = RiskAssessmentRecord {
            weight: Some(100.0),
            height: Some(160.0),
            ..Default::default()
        };
        assert_eq!(record.bmi(), Some(39.06));
        assert_eq!(record.bmi_category(), Some(BmiCategory::Obese));
    }

    #[test]
    fn test_bmi_missing_metric() {
        let record = RiskAssessmentRecord {
            weight: Some(70.0),
            ..Default::default()
        };
        assert!(record.bmi().is_none());
        assert!(record.bmi_category().is_none());
    }

    #[test]
    fn test_baseline_is_valid() {
        assert!(baseline_record().validate().is_ok());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let record = RiskAssessmentRecord {
            age: Some(0),
            weight: Some(1200.0),
            ..baseline_record()
        };
        let errors = record.validate().expect_err("Should be invalid");
        assert!(errors.iter().any(|e| e.contains("Age must be between 1 and 120")));
        assert!(errors.iter().any(|e| e.contains("Please enter a valid weight")));
    }

    #[test]
    fn test_missing_required_answers() {
        let errors = RiskAssessmentRecord::default()
            .validate()
            .expect_err("Empty record should be invalid");
        assert!(errors.contains(&"age: This field is required.".to_string()));
        assert!(errors.contains(&"diet: This field is required.".to_string()));
        assert!(!errors.iter().any(|e| e.starts_with("weight")));
    }

    #[test]
    fn test_conditional_answers_required_when_parent_is_yes() {
        let record = RiskAssessmentRecord {
            alcohol: Some(Answer::Yes),
            smoking: Some(Answer::Yes),
            family_history_female: Some(Answer::Yes),
            family_history_count: Some(0),
            ..baseline_record()
        };
        let errors = record.validate().expect_err("Should be invalid");
        assert!(errors.iter().any(|e| e.starts_with("alcohol_amount")));
        assert!(errors.iter().any(|e| e.starts_with("smoking_timing")));
        assert!(errors.iter().any(|e| e.contains("Count must be at least 1")));
    }

    #[test]
    fn test_unusual_bmi_rejected() {
        let record = RiskAssessmentRecord {
            weight: Some(20.0),
            height: Some(190.0),
            ..baseline_record()
        };
        let errors = record.validate().expect_err("Should be invalid");
        assert!(errors.iter().any(|e| e.contains("BMI seems unusual")));
    }

    #[test]
    fn test_prepare_clears_stale_conditionals() {
        let record = RiskAssessmentRecord {
            alcohol_amount: Some(AlcoholAmount::TwoOrMore),
            biopsy_report: Some(BiopsyReport::LobularCarcinomaInSitu),
            family_history_count: Some(4),
            genetic_test_result: Some(Answer::Yes),
            smoking_timing: Some(Answer::Yes),
            hormone_therapy_type: Some(HormoneTherapyType::Combined),
            ..baseline_record()
        };
        assert!(!record.is_normalized());

        let prepared = record.prepare().expect("Should prepare");
        assert!(prepared.is_normalized());
        assert!(prepared.alcohol_amount.is_none());
        assert!(prepared.biopsy_report.is_none());
        assert!(prepared.family_history_count.is_none());
        assert!(prepared.genetic_test_result.is_none());
        assert!(prepared.smoking_timing.is_none());
        assert!(prepared.hormone_therapy_type.is_none());
    }

    #[test]
    fn test_prepare_keeps_answered_conditionals() {
        let record = RiskAssessmentRecord {
            breast_biopsy: Some(Answer::Yes),
            biopsy_report: Some(BiopsyReport::RadialScar),
            ..baseline_record()
        };
        let prepared = record.prepare().expect("Should prepare");
        assert_eq!(prepared.biopsy_report, Some(BiopsyReport::RadialScar));
    }

    #[test]
    fn test_check_field() {
        assert!(check_field("age", "45").valid);
        assert_eq!(
            check_field("age", "130").errors,
            vec!["Age must be between 1 and 120 years".to_string()]
        );
        assert_eq!(
            check_field("age", "abc").errors,
            vec!["Please enter a valid age".to_string()]
        );
        assert!(!check_field("height", "-3").valid);
        assert_eq!(
            check_field("weight", "").errors,
            vec!["Please enter a valid weight".to_string()]
        );
        assert!(check_field("diet", "anything").valid);
    }

    #[test]
    fn test_record_json_uses_form_codes() {
        let json = r#"{"age": 52, "gender": "y", "biopsy_report": "23", "weight": 70.5}"#;
        let record: RiskAssessmentRecord = serde_json::from_str(json).expect("Should parse");
        assert_eq!(record.age, Some(52));
        assert_eq!(record.biopsy_report, Some(BiopsyReport::AtypicalDuctalHyperplasia));
        assert!(record.height.is_none());
    }

    #[test]
    fn test_assessment_identity() {
        let a = Assessment::new(baseline_record());
        let b = Assessment::new(baseline_record());
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
        assert_eq!(&a.id[14..15], "4");
        assert!(a.to_string().starts_with("Assessment for Yes aged 35 - "));
    }

    #[test]
    fn test_high_risk_history() {
        assert!(!baseline_record().has_high_risk_history());

        let record = RiskAssessmentRecord {
            family_history_female: Some(Answer::Yes),
            family_history_count: Some(2),
            ..baseline_record()
        };
        assert!(record.has_high_risk_history());
    }
}
