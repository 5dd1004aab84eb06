//! CSV export of stored assessments.

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::{format_bmi, Answer, Assessment, Choice};

const HEADER: [&str; 16] = [
    "ID",
    "Date Created",
    "Age",
    "Gender",
    "Ethnicity",
    "BMI",
    "BMI Category",
    "Family History Female",
    "Family History Male",
    "Personal History",
    "Genetic Test Result",
    "Physical Activity",
    "Alcohol Consumption",
    "Smoking",
    "Dense Breast",
    "Hormone Therapy",
];

/// Error type for export operations.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// File name used when the caller gives none.
#[must_use]
pub fn default_file_name(date: NaiveDate) -> String {
    format!("breast_cancer_assessments_{}.csv", date.format("%Y%m%d"))
}

fn label<C: Choice>(choice: Option<C>) -> String {
    choice.map(|c| c.label().to_string()).unwrap_or_default()
}

fn row(assessment: &Assessment) -> [String; 16] {
    let record = &assessment.record;
    [
        assessment.id.clone(),
        assessment.created_at.format("%Y-%m-%d").to_string(),
        record.age.map(|a| a.to_string()).unwrap_or_default(),
        label(record.gender),
        label(record.ethnicity),
        record.bmi().map_or_else(|| "N/A".to_string(), format_bmi),
        record
            .bmi_category()
            .map_or_else(|| "N/A".to_string(), |c| c.label().to_string()),
        label(record.family_history_female),
        label(record.family_history_male),
        label(record.personal_history),
        record
            .genetic_test_result
            .map_or_else(|| "Not tested".to_string(), |r: Answer| r.label().to_string()),
        label(record.physical_activity),
        label(record.alcohol),
        label(record.smoking),
        label(record.dense_breast),
        label(record.hormone_therapy),
    ]
}

/// Write assessments as CSV, header first.
///
/// # Errors
/// Returns error if writing to `out` fails.
pub fn export<W: Write>(assessments: &[Assessment], out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;
    for assessment in assessments {
        writer.write_record(row(assessment))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write assessments to a CSV file, replacing any existing file.
///
/// # Errors
/// Returns error if the file cannot be created or written.
pub fn export_to_path<P: AsRef<Path>>(
    assessments: &[Assessment],
    path: P,
) -> Result<(), ExportError> {
    let file = std::fs::File::create(path.as_ref())?;
    export(assessments, file)?;
    tracing::info!(
        "Exported {} assessments to {}",
        assessments.len(),
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::baseline_record;
    use crate::domain::RiskAssessmentRecord;
    use chrono::{TimeZone, Utc};

    fn assessment(record: RiskAssessmentRecord) -> Assessment {
        Assessment::created_at(record, Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap())
    }

    #[test]
    fn test_default_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(default_file_name(date), "breast_cancer_assessments_20240601.csv");
    }

    #[test]
    fn test_export_rows() {
        let tested = assessment(RiskAssessmentRecord {
            weight: Some(100.0),
            height: Some(160.0),
            genetic_test: Some(Answer::Yes),
            genetic_test_result: Some(Answer::No),
            ..baseline_record()
        });
        let no_bmi = assessment(RiskAssessmentRecord {
            height: None,
            ..baseline_record()
        });

        let mut out = Vec::new();
        export(&[tested.clone(), no_bmi.clone()], &mut out).expect("Should export");
        let text = String::from_utf8(out).expect("Should be UTF-8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID,Date Created,Age,Gender,"));
        assert_eq!(
            lines[1],
            format!(
                "{},2024-06-01,35,Yes,White,39.06,Obese,No,No,No,No,Yes,No,No,No,No",
                tested.id
            )
        );
        assert_eq!(
            lines[2],
            format!(
                "{},2024-06-01,35,Yes,White,N/A,N/A,No,No,No,Not tested,Yes,No,No,No,No",
                no_bmi.id
            )
        );
    }

    #[test]
    fn test_export_to_path() {
        let dir = tempfile::tempdir().expect("Should create dir");
        let path = dir.path().join("out.csv");
        export_to_path(&[assessment(baseline_record())], &path).expect("Should export");

        let text = std::fs::read_to_string(&path).expect("Should read");
        assert_eq!(text.lines().count(), 2);
    }
}
