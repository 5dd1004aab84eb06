//! Plain-text rendering of command output.

use std::fmt::Write;

use crate::application::{AssessmentReport, AssessmentStatistics, Dashboard, DistributionEntry};
use crate::domain::{
    format_bmi, AlcoholAmount, Answer, Assessment, BiopsyReport, Choice, Diet, Ethnicity,
    FieldCheck, HormoneTherapyType, RiskBucket, RiskReport,
};
use crate::ports::AssessmentPage;

const BUCKETS: [RiskBucket; 4] = [
    RiskBucket::High,
    RiskBucket::Moderate,
    RiskBucket::Low,
    RiskBucket::Protective,
];

fn or_dash<C: Choice>(choice: Option<C>) -> &'static str {
    choice.map_or("-", |c| c.label())
}

pub fn risk_report(report: &RiskReport) -> String {
    let mut out = String::new();
    match report.highest_bucket() {
        Some(bucket) => {
            let _ = writeln!(out, "Highest risk level: {bucket}");
        }
        None => {
            let _ = writeln!(out, "Highest risk level: none");
        }
    }

    for bucket in BUCKETS {
        let factors = report.bucket(bucket);
        let _ = writeln!(out, "{}:", bucket.heading());
        if factors.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for factor in factors {
            let _ = writeln!(out, "  - {factor}");
        }
    }

    let _ = writeln!(out, "Recommendations:");
    if report.recommendations.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for rec in &report.recommendations {
        let _ = writeln!(out, "  [{}] {}: {}", rec.priority, rec.category, rec.text);
    }
    out
}

pub fn assessment_report(report: &AssessmentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.assessment);
    let _ = writeln!(out, "ID: {}", report.assessment.id);
    match (report.bmi, report.bmi_category) {
        (Some(bmi), Some(category)) => {
            let _ = writeln!(out, "BMI: {} ({category})", format_bmi(bmi));
        }
        _ => {
            let _ = writeln!(out, "BMI: N/A");
        }
    }
    let _ = writeln!(out);
    out.push_str(&risk_report(&report.risk));
    out
}

fn assessment_line(assessment: &Assessment) -> String {
    let record = &assessment.record;
    format!(
        "{}  {}  {:>3}  {:<3}  {}",
        assessment.id,
        assessment.created_at.format("%Y-%m-%d"),
        record.age.map(|a| a.to_string()).unwrap_or_default(),
        or_dash(record.gender),
        or_dash(record.ethnicity),
    )
}

pub fn page(page: &AssessmentPage) -> String {
    let mut out = String::new();
    if page.items.is_empty() {
        let _ = writeln!(out, "No assessments found.");
        return out;
    }

    for assessment in &page.items {
        let _ = writeln!(out, "{}", assessment_line(assessment));
    }
    let _ = writeln!(
        out,
        "Showing {}-{} of {}",
        page.offset.saturating_add(1),
        page.offset.saturating_add(page.items.len()),
        page.total_count
    );
    if let Some(next) = page.next_offset() {
        let _ = writeln!(out, "Next page: --offset {next}");
    }
    out
}

fn distribution(out: &mut String, title: &str, entries: &[DistributionEntry]) {
    let _ = writeln!(out, "{title}:");
    if entries.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for entry in entries {
        let _ = writeln!(out, "  {}: {}", entry.label, entry.count);
    }
}

pub fn statistics(stats: &AssessmentStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total assessments: {}", stats.total_assessments);
    let _ = writeln!(out, "Last 30 days: {}", stats.assessments_last_month);
    match stats.avg_age {
        Some(avg) => {
            let _ = writeln!(out, "Average age: {avg:.1}");
        }
        None => {
            let _ = writeln!(out, "Average age: N/A");
        }
    }
    distribution(&mut out, "Gender", &stats.gender_distribution);
    distribution(&mut out, "Ethnicity", &stats.ethnicity_distribution);

    let family = &stats.family_history;
    let _ = writeln!(out, "Family history:");
    let _ = writeln!(out, "  Female relatives: {}", family.female_family_history);
    let _ = writeln!(out, "  Male relatives: {}", family.male_family_history);
    let _ = writeln!(out, "  Personal history: {}", family.personal_history);
    out
}

pub fn dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total assessments: {}", dashboard.total_assessments);
    let _ = writeln!(out, "High-risk history: {}", dashboard.high_risk_count);
    let _ = writeln!(out, "Age groups:");
    for group in &dashboard.age_groups {
        let _ = writeln!(out, "  {:<6} {}", group.label, group.count);
    }
    let _ = writeln!(out, "Recent assessments:");
    if dashboard.recent_assessments.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for assessment in &dashboard.recent_assessments {
        let _ = writeln!(out, "  {}", assessment_line(assessment));
    }
    out
}

pub fn field_check(check: &FieldCheck) -> String {
    if check.valid {
        "valid\n".to_string()
    } else {
        check.errors.iter().map(|e| format!("{e}\n")).collect()
    }
}

fn choice_table<C: Choice>(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}:");
    for (code, label) in C::table() {
        let _ = writeln!(out, "  {code:>2}  {label}");
    }
}

/// Every enumerated question with its codes.
pub fn choices() -> String {
    let mut out = String::new();
    choice_table::<Answer>(&mut out, "Yes/No");
    choice_table::<Ethnicity>(&mut out, "Ethnicity");
    choice_table::<AlcoholAmount>(&mut out, "Alcohol amount");
    choice_table::<HormoneTherapyType>(&mut out, "Hormone therapy type");
    choice_table::<BiopsyReport>(&mut out, "Biopsy report");
    choice_table::<Diet>(&mut out, "Diet");
    out
}

/// JSON form of [`choices`].
pub fn choices_json() -> serde_json::Value {
    fn table<C: Choice>() -> serde_json::Value {
        C::table()
            .into_iter()
            .map(|(code, label)| serde_json::json!({ "code": code, "label": label }))
            .collect()
    }

    serde_json::json!({
        "answer": table::<Answer>(),
        "ethnicity": table::<Ethnicity>(),
        "alcohol_amount": table::<AlcoholAmount>(),
        "hormone_therapy_type": table::<HormoneTherapyType>(),
        "biopsy_report": table::<BiopsyReport>(),
        "diet": table::<Diet>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, Recommendation};

    #[test]
    fn test_risk_report_sections() {
        let report = RiskReport {
            high_risk: vec!["Age 65 or older".to_string()],
            recommendations: vec![Recommendation::new(
                "Screening",
                "Annual mammography screening is recommended",
                Priority::High,
            )],
            ..Default::default()
        };

        let text = risk_report(&report);
        assert!(text.starts_with(
            "Highest risk level: HIGH\nHigh risk factors:\n  - Age 65 or older\n"
        ));
        assert!(text.contains("Moderate risk factors:\n  (none)\n"));
        assert!(text.ends_with(
            "Recommendations:\n  [high] Screening: Annual mammography screening is recommended\n"
        ));
    }

    #[test]
    fn test_risk_report_highest_level() {
        let moderate = RiskReport {
            moderate_risk: vec!["Dense breast tissue".to_string()],
            protective: vec!["Regular physical activity".to_string()],
            ..Default::default()
        };
        assert!(risk_report(&moderate).starts_with("Highest risk level: MODERATE\n"));

        let protective_only = RiskReport {
            protective: vec!["Regular physical activity".to_string()],
            ..Default::default()
        };
        assert!(risk_report(&protective_only).starts_with("Highest risk level: none\n"));
    }

    #[test]
    fn test_page_footer_at_large_offset() {
        let last = AssessmentPage::new(
            vec![Assessment::new(crate::domain::fixtures::baseline_record())],
            3,
            usize::MAX,
            20,
        );
        let text = page(&last);
        assert!(text.contains(&format!("Showing {max}-{max} of 3\n", max = usize::MAX)));
        assert!(!text.contains("Next page"));
    }

    #[test]
    fn test_choices_list_every_biopsy_code() {
        let text = choices();
        assert!(text.contains("25  Lobular carcinoma in situ (LCIS)"));

        let json = choices_json();
        assert_eq!(json["biopsy_report"].as_array().map(Vec::len), Some(25));
        assert_eq!(json["answer"][0]["code"], "y");
    }

    #[test]
    fn test_field_check_text() {
        let check = FieldCheck {
            valid: false,
            errors: vec!["Please enter a valid age".to_string()],
        };
        assert_eq!(field_check(&check), "Please enter a valid age\n");
    }
}
