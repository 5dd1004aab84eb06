//! Command-line front end.
//!
//! `parse_args` turns argv into an [`Invocation`]; [`App`] wires the services
//! to storage and runs it, writing results to any `io::Write`.

mod render;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::adapters::csv_export;
use crate::adapters::sqlite::SqliteStorage;
use crate::application::{ScreeningService, StatisticsService};
use crate::config::Config;
use crate::domain::{check_field, Answer, Choice, Ethnicity, RiskAssessmentRecord};
use crate::ports::AssessmentFilter;

pub const USAGE: &str = "\
Usage: oncoscreen [--json] <command>

Commands:
  classify <record.json|->        Validate and classify without storing
  assess <record.json|->          Validate, store and classify
  show <id>                       Show a stored assessment with its report
  update <id> <record.json|->     Replace a stored questionnaire
  delete <id>                     Delete a stored assessment
  list [--search s] [--from YYYY-MM-DD] [--to YYYY-MM-DD]
       [--min-age n] [--max-age n] [--ethnicity code] [--gender y|n]
       [--offset n] [--limit n]
  stats                           Aggregate statistics
  dashboard                       Recent assessments and quick counts
  export [path]                   Write all assessments as CSV
  check-field <name> <value>      Validate a single age, weight or height
  choices                         List answer codes for every question
";

/// Malformed command line.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct UsageError(String);

fn usage(msg: impl Into<String>) -> UsageError {
    UsageError(msg.into())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Classify { input: PathBuf },
    Assess { input: PathBuf },
    Show { id: String },
    Update { id: String, input: PathBuf },
    Delete { id: String },
    List {
        filter: AssessmentFilter,
        offset: usize,
        limit: Option<usize>,
    },
    Stats,
    Dashboard,
    Export { path: Option<PathBuf> },
    CheckField { field: String, value: String },
    Choices,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    /// Print results as JSON
    pub json: bool,
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, UsageError> {
    value
        .parse()
        .map_err(|_| usage(format!("{flag} expects a number, got '{value}'")))
}

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate, UsageError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| usage(format!("{flag} expects YYYY-MM-DD, got '{value}'")))
}

fn required(
    args: &mut impl Iterator<Item = String>,
    command: &str,
    what: &str,
) -> Result<String, UsageError> {
    args.next()
        .ok_or_else(|| usage(format!("{command}: missing <{what}>")))
}

fn parse_list(args: &mut impl Iterator<Item = String>) -> Result<Command, UsageError> {
    let mut filter = AssessmentFilter::default();
    let mut offset = 0;
    let mut limit = None;

    while let Some(flag) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| usage(format!("{flag} needs a value")))?;
        match flag.as_str() {
            "--search" => filter.search = Some(value),
            "--from" => filter.date_from = Some(parse_date(&flag, &value)?),
            "--to" => filter.date_to = Some(parse_date(&flag, &value)?),
            "--min-age" => filter.age_min = Some(parse_number(&flag, &value)?),
            "--max-age" => filter.age_max = Some(parse_number(&flag, &value)?),
            "--ethnicity" => {
                filter.ethnicity = Some(
                    Ethnicity::from_code(&value)
                        .ok_or_else(|| usage(format!("Unknown ethnicity code '{value}'")))?,
                );
            }
            "--gender" => {
                filter.gender = Some(
                    Answer::from_code(&value)
                        .ok_or_else(|| usage(format!("--gender expects y or n, got '{value}'")))?,
                );
            }
            "--offset" => offset = parse_number(&flag, &value)?,
            "--limit" => limit = Some(parse_number(&flag, &value)?),
            other => return Err(usage(format!("Unknown list option '{other}'"))),
        }
    }

    Ok(Command::List {
        filter,
        offset,
        limit,
    })
}

/// Parse command-line arguments (without the program name).
///
/// # Errors
/// Returns a `UsageError` describing the first problem found.
pub fn parse_args<I>(args: I) -> Result<Invocation, UsageError>
where
    I: IntoIterator<Item = String>,
{
    let mut json = false;
    let mut rest = Vec::new();
    for arg in args {
        if arg == "--json" {
            json = true;
        } else {
            rest.push(arg);
        }
    }

    let mut args = rest.into_iter();
    let name = args.next().unwrap_or_else(|| "help".to_string());
    let cmd = name.as_str();

    let command = match cmd {
        "classify" => Command::Classify {
            input: required(&mut args, cmd, "record.json")?.into(),
        },
        "assess" => Command::Assess {
            input: required(&mut args, cmd, "record.json")?.into(),
        },
        "show" => Command::Show {
            id: required(&mut args, cmd, "id")?,
        },
        "update" => Command::Update {
            id: required(&mut args, cmd, "id")?,
            input: required(&mut args, cmd, "record.json")?.into(),
        },
        "delete" => Command::Delete {
            id: required(&mut args, cmd, "id")?,
        },
        "check-field" => Command::CheckField {
            field: required(&mut args, cmd, "name")?,
            value: required(&mut args, cmd, "value")?,
        },
        "list" => parse_list(&mut args)?,
        "stats" => Command::Stats,
        "dashboard" => Command::Dashboard,
        "export" => Command::Export {
            path: args.next().map(PathBuf::from),
        },
        "choices" => Command::Choices,
        "help" | "-h" | "--help" => Command::Help,
        other => return Err(usage(format!("Unknown command '{other}'"))),
    };

    if let Some(extra) = args.next() {
        return Err(usage(format!("Unexpected argument '{extra}'")));
    }

    Ok(Invocation { command, json })
}

/// Read a questionnaire from a JSON file, or stdin for `-`.
fn read_record(input: &Path) -> Result<RiskAssessmentRecord> {
    let text = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read record from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?
    };

    serde_json::from_str(&text).context("Record is not valid questionnaire JSON")
}

fn emit<T: serde::Serialize>(
    out: &mut impl Write,
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        write!(out, "{}", text(value))?;
    }
    Ok(())
}

/// Command-line application state.
pub struct App {
    screening: ScreeningService<SqliteStorage>,
    statistics: StatisticsService<SqliteStorage>,
    page_size: usize,
}

impl App {
    /// Open the configured database and build the services.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened.
    pub fn new(config: &Config) -> Result<Self> {
        let storage = SqliteStorage::new(&config.db_path)
            .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
        Ok(Self::with_storage(Arc::new(storage), config.page_size))
    }

    /// Build the application around an existing storage adapter.
    pub fn with_storage(storage: Arc<SqliteStorage>, page_size: usize) -> Self {
        Self {
            screening: ScreeningService::new(storage.clone()),
            statistics: StatisticsService::new(storage),
            page_size,
        }
    }

    /// Run one invocation, writing its output to `out`.
    ///
    /// # Errors
    /// Returns error if the command fails.
    pub fn run(&self, invocation: Invocation, out: &mut impl Write) -> Result<()> {
        let json = invocation.json;

        match invocation.command {
            Command::Classify { input } => {
                let report = self.screening.preview(read_record(&input)?)?;
                emit(out, json, &report, render::risk_report)?;
            }
            Command::Assess { input } => {
                let stored = self.screening.submit(read_record(&input)?)?;
                let report = self.screening.report(&stored.id)?;
                emit(out, json, &report, render::assessment_report)?;
            }
            Command::Show { id } => {
                let report = self.screening.report(&id)?;
                emit(out, json, &report, render::assessment_report)?;
            }
            Command::Update { id, input } => {
                let updated = self.screening.update(&id, read_record(&input)?)?;
                emit(out, json, &updated, |a| format!("Updated {}\n", a.id))?;
            }
            Command::Delete { id } => {
                self.screening.delete(&id)?;
                if json {
                    writeln!(out, "{}", serde_json::json!({ "deleted": id }))?;
                } else {
                    writeln!(out, "Deleted {id}")?;
                }
            }
            Command::List {
                filter,
                offset,
                limit,
            } => {
                let page = self
                    .screening
                    .list(&filter, offset, limit.unwrap_or(self.page_size))?;
                emit(out, json, &page, render::page)?;
            }
            Command::Stats => {
                let stats = self.statistics.statistics(chrono::Utc::now())?;
                emit(out, json, &stats, render::statistics)?;
            }
            Command::Dashboard => {
                let dashboard = self.statistics.dashboard()?;
                emit(out, json, &dashboard, render::dashboard)?;
            }
            Command::Export { path } => {
                let path = path.unwrap_or_else(|| {
                    PathBuf::from(csv_export::default_file_name(
                        chrono::Local::now().date_naive(),
                    ))
                });
                let assessments = self.screening.all()?;
                csv_export::export_to_path(&assessments, &path)?;
                writeln!(
                    out,
                    "Exported {} assessments to {}",
                    assessments.len(),
                    path.display()
                )?;
            }
            Command::CheckField { field, value } => {
                let check = check_field(&field, &value);
                emit(out, json, &check, render::field_check)?;
            }
            Command::Choices => {
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&render::choices_json())?)?;
                } else {
                    write!(out, "{}", render::choices())?;
                }
            }
            Command::Help => write!(out, "{USAGE}")?,
        }

        Ok(())
    }
}
