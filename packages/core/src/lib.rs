// ABOUTME: Core constants and utilities for Tasklane
// ABOUTME: Foundational package providing shared functionality across all Tasklane packages

pub mod constants;
pub mod utils;

// Re-export constants
pub use constants::{
    default_database_path, default_upload_dir, tasklane_dir, DEFAULT_MAX_UPLOAD_BYTES,
    PREVIEW_LIMIT, UPLOAD_BATCH_WINDOW_SECS,
};

// Re-export utilities
pub use utils::{generate_id, truncate};
