pub mod constants;
pub mod errors;
pub mod file_operations;
pub mod logger;

pub use errors::ImportIdSetLibError;
pub use logger::{init_logger, LoggerConfig};
