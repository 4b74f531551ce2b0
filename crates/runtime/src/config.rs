use std::path::PathBuf;

pub const PROGRAM_NAME: &str = "loadgen";
pub const PROGRAM_LOG_LEVEL: &str = "LOADGEN_LOG_LEVEL";

/// Project that all documents are written under.
pub const PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
/// Service account credentials, as a JSON document.
pub const SERVICE_ACCOUNT_ENV: &str = "FIREBASE_SERVICE_ACCOUNT_JSON";

pub const DEFAULT_RECORD_COLLECTION: &str = "perf-test4";
pub const DEFAULT_BATCH_COLLECTION: &str = "perf-test-batches4";

pub fn xdg_or_home(xdg_var: &str, home_suffix: &str) -> PathBuf {
    if let Some(dir) = std::env::var_os(xdg_var)
        && !dir.is_empty()
    {
        PathBuf::from(dir)
    } else {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(home_suffix)
    }
}

/// Root directory of the local document store.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| xdg_or_home("XDG_DATA_HOME", ".local/share"))
        .join(PROGRAM_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
