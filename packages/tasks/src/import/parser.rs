// ABOUTME: Tabular upload parsing for CSV and spreadsheet files
// ABOUTME: Turns raw file bytes into ordered header-to-cell rows and reclaims the staged file

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::{TaskError, TaskResult};
use tasklane_core::generate_id;

/// Input encodings accepted for bulk upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    /// Detect the encoding from the file extension, falling back to the declared mime type
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => return Some(FileKind::Csv),
            Some("xlsx" | "xls" | "xlsm" | "xlsb" | "ods") => return Some(FileKind::Spreadsheet),
            _ => {}
        }

        let mime = content_type?.to_ascii_lowercase();
        if mime.starts_with("text/csv") || mime == "application/csv" {
            Some(FileKind::Csv)
        } else if mime.contains("spreadsheet") || mime.contains("ms-excel") {
            Some(FileKind::Spreadsheet)
        } else {
            None
        }
    }
}

/// A loosely-typed cell as read from the source file
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell the way a spreadsheet would display it as plain text
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                format!("{}", *number as i64)
            }
            CellValue::Number(number) => number.to_string(),
            CellValue::Bool(value) => value.to_string(),
            CellValue::DateTime(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
                CellValue::Text(text.clone())
            }
            Data::Int(number) => CellValue::Number(*number as f64),
            Data::Float(number) => CellValue::Number(*number),
            Data::Bool(value) => CellValue::Bool(*value),
            Data::DateTime(value) => value
                .as_datetime()
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Number(value.as_f64())),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }
}

/// One data row keyed by the original column headers, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cell; blank headers and empty cells are not kept
    pub fn insert(&mut self, header: impl Into<String>, value: CellValue) {
        let header = header.into();
        if header.is_empty() || value.is_empty() {
            return;
        }
        self.cells.push((header, value));
    }

    pub fn with(mut self, header: &str, value: CellValue) -> Self {
        self.insert(header, value);
        self
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(key, _)| key == header)
            .map(|(_, value)| value)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(key, _)| key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Parse raw file bytes into rows; the first line (or first sheet row) is the header
pub fn parse_bytes(kind: FileKind, bytes: &[u8]) -> TaskResult<Vec<Row>> {
    let rows = match kind {
        FileKind::Csv => parse_csv(bytes)?,
        FileKind::Spreadsheet => parse_spreadsheet(bytes)?,
    };
    debug!("Parsed {} rows from {:?} upload", rows.len(), kind);
    Ok(rows)
}

fn clean_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_string()
}

/// Fields that are not valid UTF-8 are decoded lossily. Comma-only records are
/// kept as (empty) rows so they keep their row number.
pub fn parse_csv(bytes: &[u8]) -> TaskResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| TaskError::Parse(e.to_string()))?
        .iter()
        .map(|field| clean_header(&String::from_utf8_lossy(field)))
        .collect();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|e| TaskError::Parse(e.to_string()))?;
        let mut row = Row::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(
                header.clone(),
                CellValue::Text(String::from_utf8_lossy(field).into_owned()),
            );
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Read the first worksheet of an xlsx/xls/ods workbook
pub fn parse_spreadsheet(bytes: &[u8]) -> TaskResult<Vec<Row>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| TaskError::Parse(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| TaskError::Parse(e.to_string()))?,
        None => return Ok(Vec::new()),
    };

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(cells) => cells
            .iter()
            .map(|cell| clean_header(&CellValue::from(cell).as_text()))
            .collect(),
        None => return Ok(Vec::new()),
    };

    let rows = sheet_rows
        .map(|cells| {
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(cells.iter()) {
                row.insert(header.clone(), CellValue::from(cell));
            }
            row
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(rows)
}

/// An uploaded file staged on disk; removed when dropped
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub fn persist(dir: &Path, original_name: &str, bytes: &[u8]) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "{}-{}",
            generate_id("upload"),
            sanitize_file_name(original_name)
        ));
        fs::write(&path, bytes)?;
        debug!("Staged upload at {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed staged upload {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove staged upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// A staged upload together with what the client declared about it
#[derive(Debug)]
pub struct UploadedFile {
    pub file: TempUpload,
    pub original_name: String,
    pub content_type: Option<String>,
}

impl UploadedFile {
    pub fn stage(
        dir: &Path,
        original_name: &str,
        content_type: Option<String>,
        bytes: &[u8],
    ) -> io::Result<Self> {
        Ok(Self {
            file: TempUpload::persist(dir, original_name, bytes)?,
            original_name: original_name.to_string(),
            content_type,
        })
    }
}

/// Parse a staged upload, consuming it so the file is removed on every exit path
pub fn parse_upload(upload: UploadedFile) -> TaskResult<Vec<Row>> {
    let kind = FileKind::detect(&upload.original_name, upload.content_type.as_deref()).ok_or_else(
        || TaskError::UnsupportedFormat {
            file_name: upload.original_name.clone(),
        },
    )?;
    let bytes = upload.file.read()?;
    parse_bytes(kind, &bytes)
}
