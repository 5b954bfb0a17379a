// ABOUTME: Row normalization from parsed upload rows into typed task candidates
// ABOUTME: Resolves header aliases, applies defaults and lenient due-date parsing

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::parser::{CellValue, Row};
use crate::error::RowError;
use crate::types::TaskPriority;

/// Accepted headers per field, in lookup order
pub const TITLE_HEADERS: &[&str] = &["Title", "title", "Task", "task"];
pub const DESCRIPTION_HEADERS: &[&str] = &["Description", "description", "Notes", "notes"];
pub const PRIORITY_HEADERS: &[&str] = &["Priority", "priority"];
pub const DUE_DATE_HEADERS: &[&str] = &["DueDate", "dueDate", "Due Date"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%b %d, %Y"];

/// Largest serial number a spreadsheet date can hold (9999-12-31)
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

/// A validated row, ready for assignment
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCandidate {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
}

/// Turn one parsed row into a task candidate. Pure: no I/O.
pub fn normalize_row(row: &Row) -> Result<TaskCandidate, RowError> {
    let title = first_text(row, TITLE_HEADERS)
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .ok_or(RowError::MissingTitle)?;

    let description = first_text(row, DESCRIPTION_HEADERS).unwrap_or_default();

    let priority = first_text(row, PRIORITY_HEADERS)
        .and_then(|value| TaskPriority::from_exact(&value))
        .unwrap_or_default();

    let due_date = first_value(row, DUE_DATE_HEADERS).and_then(parse_due_date);

    Ok(TaskCandidate {
        title,
        description,
        priority,
        due_date,
    })
}

fn first_value<'a>(row: &'a Row, headers: &[&str]) -> Option<&'a CellValue> {
    headers
        .iter()
        .filter_map(|header| row.get(header))
        .find(|value| !value.is_empty())
}

fn first_text(row: &Row, headers: &[&str]) -> Option<String> {
    first_value(row, headers).map(CellValue::as_text)
}

/// Best-effort date parsing; anything unrecognized yields `None`
pub fn parse_due_date(value: &CellValue) -> Option<DateTime<Utc>> {
    match value {
        CellValue::DateTime(naive) => Some(Utc.from_utc_datetime(naive)),
        CellValue::Number(serial) => from_serial_date(*serial),
        CellValue::Text(text) => parse_date_text(text.trim()),
        CellValue::Bool(_) | CellValue::Empty => None,
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Spreadsheet serial dates count days from 1899-12-30
fn from_serial_date(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL_DATE {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch
        .checked_add_signed(Duration::seconds(seconds))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
