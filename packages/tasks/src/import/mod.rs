// ABOUTME: Bulk import pipeline stages
// ABOUTME: File parsing and row normalization ahead of assignment and persistence

pub mod normalizer;
pub mod parser;

pub use normalizer::{normalize_row, parse_due_date, TaskCandidate};
pub use parser::{parse_bytes, parse_upload, CellValue, FileKind, Row, TempUpload, UploadedFile};
