use std::env;
use std::path::PathBuf;

/// Number of created tasks and error messages echoed back in an upload report
pub const PREVIEW_LIMIT: usize = 10;

/// Default maximum accepted upload size (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Tasks from the same creator closer together than this belong to one upload batch
pub const UPLOAD_BATCH_WINDOW_SECS: i64 = 5 * 60;

/// Get the path to the Tasklane directory (~/.tasklane)
pub fn tasklane_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".tasklane")
    } else {
        // Fall back to dirs crate for normal usage, then the working directory
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tasklane")
    }
}

/// Default SQLite database location (~/.tasklane/tasklane.db)
pub fn default_database_path() -> PathBuf {
    tasklane_dir().join("tasklane.db")
}

/// Default directory where uploaded files are staged before parsing (~/.tasklane/uploads)
pub fn default_upload_dir() -> PathBuf {
    tasklane_dir().join("uploads")
}
