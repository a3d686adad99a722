//! Shared utilities: logging setup, timing, configuration checks.

pub mod logging;
pub mod validation;

pub use logging::{init_logger, log_file_path, open_log_file, timed};
pub use validation::{validate_log_file_name, validate_references, validate_side_name, validate_side_names};
