//! SQLite adapter: Implementation of AssessmentStore.
//!
//! Provides local persistence for assessments. The columns used for
//! filtering (age, gender, ethnicity, creation time) are stored alongside the
//! full questionnaire as JSON.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from panic
//! in another thread) will cause panic. This fail-fast behavior is intentional
//! for data integrity in healthcare applications.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use crate::domain::{Assessment, Choice, RiskAssessmentRecord};
use crate::ports::{AssessmentFilter, AssessmentPage, AssessmentStore};

const SELECT_COLUMNS: &str = "id, record_json, created_at, updated_at";

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(String),
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

/// Columns of one row before decoding.
struct StoredRow {
    id: String,
    record_json: String,
    created_at: String,
    updated_at: String,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            record_json: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }

    fn into_assessment(self) -> Result<Assessment, StorageError> {
        let record: RiskAssessmentRecord = serde_json::from_str(&self.record_json)?;
        Ok(Assessment {
            id: self.id,
            record,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // Fixed-width UTC so lexical order matches chronological order.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp(raw.to_string()))
}

/// SQLite integers are signed; larger counts clamp to `i64::MAX`.
fn sql_count(n: usize) -> Value {
    Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Translate a filter into a WHERE clause and its positional values.
fn filter_clause(filter: &AssessmentFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("(instr(CAST(age AS TEXT), ?) > 0 OR instr(ethnicity, ?) > 0)");
        values.push(Value::Text(search.to_string()));
        values.push(Value::Text(search.to_string()));
    }
    if let Some(from) = filter.date_from {
        conditions.push("substr(created_at, 1, 10) >= ?");
        values.push(Value::Text(from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = filter.date_to {
        conditions.push("substr(created_at, 1, 10) <= ?");
        values.push(Value::Text(to.format("%Y-%m-%d").to_string()));
    }
    if let Some(min) = filter.age_min {
        conditions.push("age >= ?");
        values.push(Value::Integer(i64::from(min)));
    }
    if let Some(max) = filter.age_max {
        conditions.push("age <= ?");
        values.push(Value::Integer(i64::from(max)));
    }
    if let Some(ethnicity) = filter.ethnicity {
        conditions.push("ethnicity = ?");
        values.push(Value::Text(ethnicity.code().to_string()));
    }
    if let Some(gender) = filter.gender {
        conditions.push("gender = ?");
        values.push(Value::Text(gender.code().to_string()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), values)
    }
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("Lock failed")
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn().execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS breast_cancer_risk_assessment (
                id TEXT PRIMARY KEY,
                age INTEGER,
                gender TEXT,
                ethnicity TEXT,
                record_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_assessment_created
                ON breast_cancer_risk_assessment(created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_assessment_age
                ON breast_cancer_risk_assessment(age);
            CREATE INDEX IF NOT EXISTS idx_assessment_gender
                ON breast_cancer_risk_assessment(gender);
            CREATE INDEX IF NOT EXISTS idx_assessment_ethnicity
                ON breast_cancer_risk_assessment(ethnicity);
            ",
        )?;

        Ok(())
    }

    fn query_assessments(
        conn: &Connection,
        sql: &str,
        values: &[Value],
    ) -> Result<Vec<Assessment>, StorageError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), StoredRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredRow::into_assessment).collect()
    }
}

impl AssessmentStore for SqliteStorage {
    type Error = StorageError;

    fn insert_assessment(&self, assessment: &Assessment) -> Result<(), Self::Error> {
        let record_json = serde_json::to_string(&assessment.record)?;
        let record = &assessment.record;

        self.conn().execute(
            r"
            INSERT INTO breast_cancer_risk_assessment (
                id, age, gender, ethnicity, record_json, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                assessment.id,
                record.age,
                record.gender.map(Choice::code),
                record.ethnicity.map(Choice::code),
                record_json,
                format_timestamp(&assessment.created_at),
                format_timestamp(&assessment.updated_at),
            ],
        )?;

        tracing::debug!("Saved assessment {} to storage", assessment.id);
        Ok(())
    }

    fn update_assessment(&self, assessment: &Assessment) -> Result<bool, Self::Error> {
        let record_json = serde_json::to_string(&assessment.record)?;
        let record = &assessment.record;

        let changed = self.conn().execute(
            r"
            UPDATE breast_cancer_risk_assessment
            SET age = ?2, gender = ?3, ethnicity = ?4, record_json = ?5, updated_at = ?6
            WHERE id = ?1
            ",
            params![
                assessment.id,
                record.age,
                record.gender.map(Choice::code),
                record.ethnicity.map(Choice::code),
                record_json,
                format_timestamp(&assessment.updated_at),
            ],
        )?;

        tracing::debug!("Updated assessment {} ({} row)", assessment.id, changed);
        Ok(changed > 0)
    }

    fn load_assessment(&self, id: &str) -> Result<Option<Assessment>, Self::Error> {
        let conn = self.conn();
        let sql = format!("SELECT {SELECT_COLUMNS} FROM breast_cancer_risk_assessment WHERE id = ?");
        let mut found = Self::query_assessments(&conn, &sql, &[Value::Text(id.to_string())])?;
        Ok(found.pop())
    }

    fn load_assessments(&self) -> Result<Vec<Assessment>, Self::Error> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM breast_cancer_risk_assessment ORDER BY created_at DESC"
        );
        Self::query_assessments(&conn, &sql, &[])
    }

    fn load_recent_assessments(&self, limit: usize) -> Result<Vec<Assessment>, Self::Error> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM breast_cancer_risk_assessment ORDER BY created_at DESC LIMIT ?"
        );
        Self::query_assessments(&conn, &sql, &[sql_count(limit)])
    }

    fn load_assessments_paginated(
        &self,
        filter: &AssessmentFilter,
        offset: usize,
        limit: usize,
    ) -> Result<AssessmentPage, Self::Error> {
        let conn = self.conn();
        let (where_clause, mut values) = filter_clause(filter);

        // Get matching count
        let total_count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM breast_cancer_risk_assessment {where_clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        // Fetch page with LIMIT/OFFSET
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM breast_cancer_risk_assessment {where_clause} \
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        values.push(sql_count(limit));
        values.push(sql_count(offset));
        let items = Self::query_assessments(&conn, &sql, &values)?;

        let total_count = usize::try_from(total_count).unwrap_or(0);
        Ok(AssessmentPage::new(items, total_count, offset, limit))
    }

    fn count_assessments(&self) -> Result<usize, Self::Error> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM breast_cancer_risk_assessment",
            [],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    fn delete_assessment(&self, id: &str) -> Result<bool, Self::Error> {
        let deleted = self.conn().execute(
            "DELETE FROM breast_cancer_risk_assessment WHERE id = ?1",
            params![id],
        )?;
        Ok(deleted > 0)
    }

    fn clear_all(&self) -> Result<(), Self::Error> {
        self.conn()
            .execute_batch("DELETE FROM breast_cancer_risk_assessment;")?;
        tracing::warn!("Cleared all assessments from storage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::baseline_record;
    use crate::domain::{Answer, Ethnicity};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn assessment(age: u32, created_at: DateTime<Utc>) -> Assessment {
        Assessment::created_at(
            RiskAssessmentRecord {
                age: Some(age),
                ..baseline_record()
            },
            created_at,
        )
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_assessment_crud() {
        let storage = SqliteStorage::in_memory().expect("Should create db");

        // No assessments initially
        assert_eq!(storage.count_assessments().expect("Should count"), 0);

        // Save assessment
        let saved = Assessment::new(baseline_record());
        let id = saved.id.clone();
        storage.insert_assessment(&saved).expect("Should save");
        assert_eq!(storage.count_assessments().expect("Should count"), 1);

        // Load it back
        let loaded = storage
            .load_assessment(&id)
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(loaded.record, saved.record);
        assert_eq!(loaded.created_at, saved.created_at);

        // Update
        let mut changed = loaded.clone();
        changed.record.age = Some(61);
        changed.updated_at = changed.created_at + Duration::minutes(5);
        assert!(storage.update_assessment(&changed).expect("Should update"));
        let reloaded = storage
            .load_assessment(&id)
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(reloaded.record.age, Some(61));
        assert_eq!(reloaded.created_at, saved.created_at);
        assert_eq!(reloaded.updated_at, changed.updated_at);

        // Delete
        assert!(storage.delete_assessment(&id).expect("Should delete"));
        assert!(!storage.delete_assessment(&id).expect("Should delete"));
        assert_eq!(storage.count_assessments().expect("Should count"), 0);
    }

    #[test]
    fn test_update_unknown_id() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let ghost = Assessment::new(baseline_record());
        assert!(!storage.update_assessment(&ghost).expect("Should run"));
        assert!(storage.load_assessment(&ghost.id).expect("Should load").is_none());
    }

    #[test]
    fn test_recent_is_newest_first() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        for (i, d) in [3, 1, 2].into_iter().enumerate() {
            let a = assessment(30 + i as u32, day(2024, 5, d));
            storage.insert_assessment(&a).expect("Should save");
        }

        let recent = storage.load_recent_assessments(2).expect("Should load");
        let days: Vec<u32> = recent
            .iter()
            .map(|a| a.created_at.format("%d").to_string().parse().unwrap())
            .collect();
        assert_eq!(days, vec![3, 2]);
        assert_eq!(storage.load_assessments().expect("Should load").len(), 3);
    }

    #[test]
    fn test_filtered_pagination() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        for d in 1..=25 {
            let mut a = assessment(40 + d, day(2024, 3, d));
            if d % 5 == 0 {
                a.record.ethnicity = Some(Ethnicity::AfricanAmerican);
            }
            storage.insert_assessment(&a).expect("Should save");
        }

        let page = storage
            .load_assessments_paginated(&AssessmentFilter::default(), 0, 20)
            .expect("Should page");
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.next_offset(), Some(20));

        let by_date = AssessmentFilter {
            date_from: NaiveDate::from_ymd_opt(2024, 3, 10),
            date_to: NaiveDate::from_ymd_opt(2024, 3, 12),
            ..Default::default()
        };
        let page = storage
            .load_assessments_paginated(&by_date, 0, 20)
            .expect("Should page");
        assert_eq!(page.total_count, 3);
        assert_eq!(page.items[0].record.age, Some(52));

        let by_ethnicity = AssessmentFilter {
            ethnicity: Some(Ethnicity::AfricanAmerican),
            age_min: Some(50),
            ..Default::default()
        };
        let page = storage
            .load_assessments_paginated(&by_ethnicity, 0, 20)
            .expect("Should page");
        // days 10, 15, 20, 25 -> ages 50, 55, 60, 65
        assert_eq!(page.total_count, 4);
        assert!(!page.has_more);

        let search = AssessmentFilter {
            search: Some("47".to_string()),
            gender: Some(Answer::Yes),
            ..Default::default()
        };
        let page = storage
            .load_assessments_paginated(&search, 0, 20)
            .expect("Should page");
        assert_eq!(page.total_count, 1);
    }

    #[test]
    fn test_offset_past_i64_range() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        for d in 1..=3 {
            storage
                .insert_assessment(&assessment(50, day(2024, 3, d)))
                .expect("Should save");
        }

        let page = storage
            .load_assessments_paginated(&AssessmentFilter::default(), usize::MAX, usize::MAX)
            .expect("Should page");
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 3);
        assert!(!page.has_more);
        assert_eq!(page.next_offset(), None);

        let recent = storage
            .load_recent_assessments(usize::MAX)
            .expect("Should load");
        assert_eq!(recent.len(), 3);
    }

    #[test]
    fn test_filter_columns_are_indexed() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let conn = storage.conn();
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'index' AND tbl_name = 'breast_cancer_risk_assessment' \
                 AND name LIKE 'idx_assessment_%' ORDER BY name",
            )
            .expect("Should prepare");
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("Should query")
            .collect::<Result<_, _>>()
            .expect("Should read");
        assert_eq!(
            names,
            vec![
                "idx_assessment_age",
                "idx_assessment_created",
                "idx_assessment_ethnicity",
                "idx_assessment_gender",
            ]
        );
    }

    #[test]
    fn test_clear_all() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        storage
            .insert_assessment(&Assessment::new(baseline_record()))
            .expect("Should save");
        storage.clear_all().expect("Should clear");
        assert_eq!(storage.count_assessments().expect("Should count"), 0);
    }

    #[test]
    fn test_file_backed_storage_persists() {
        let dir = tempfile::tempdir().expect("Should create dir");
        let path = dir.path().join("screening.db");
        let saved = Assessment::new(baseline_record());

        {
            let storage = SqliteStorage::new(&path).expect("Should open");
            storage.insert_assessment(&saved).expect("Should save");
        }

        let storage = SqliteStorage::new(&path).expect("Should reopen");
        assert!(storage.load_assessment(&saved.id).expect("Should load").is_some());
    }
}
