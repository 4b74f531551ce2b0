mod config;
pub mod logging;

pub use config::{
    DEFAULT_BATCH_COLLECTION, DEFAULT_RECORD_COLLECTION, PROGRAM_LOG_LEVEL, PROGRAM_NAME,
    PROJECT_ID_ENV, SERVICE_ACCOUNT_ENV, default_data_dir, xdg_or_home,
};

pub use logging::init;
