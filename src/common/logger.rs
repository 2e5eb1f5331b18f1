use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::common::constants::LOG_TARGET;
use crate::common::errors::ImportIdSetLibError;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l})} [{T}] {t} - {m}{n}";
const LOG_FILE_NAME: &str = "import_id_set.log";

static LOG4RS_HANDLE: Lazy<Mutex<Option<Handle>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub log_directory: PathBuf,
    pub log_level: String,
    pub log_in_file: bool,
    pub console_display: bool,
    pub only_record_import_id_set: bool,
}

impl LoggerConfig {
    pub fn new(
        log_directory: impl Into<PathBuf>,
        log_level: impl Into<String>,
        log_in_file: bool,
        console_display: bool,
        only_record_import_id_set: bool,
    ) -> Self {
        Self {
            log_directory: log_directory.into(),
            log_level: log_level.into(),
            log_in_file,
            console_display,
            only_record_import_id_set,
        }
    }

    /// Supported levels: off, error, warn, info, debug, trace.
    pub fn level_filter(&self) -> Result<LevelFilter, ImportIdSetLibError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|e| ImportIdSetLibError::LoggerError(format!("invalid log level `{}`: {}", self.log_level, e)))
    }

    pub fn build_logger_config(&self) -> Result<Config, ImportIdSetLibError> {
        let level = self.level_filter()?;
        let mut builder = Config::builder();
        let mut appenders: Vec<String> = vec![];

        if self.console_display {
            let console = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(LOG_PATTERN))).build();
            builder = builder.appender(Appender::builder().build("console", Box::new(console)));
            appenders.push("console".to_string());
        }
        if self.log_in_file {
            let file = FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
                .build(self.log_directory.join(LOG_FILE_NAME))
                .map_err(|e| ImportIdSetLibError::LoggerError(e.to_string()))?;
            builder = builder.appender(Appender::builder().build("file", Box::new(file)));
            appenders.push("file".to_string());
        }

        let config = if self.only_record_import_id_set {
            builder
                .logger(Logger::builder().appenders(appenders).additive(false).build(LOG_TARGET, level))
                .build(Root::builder().build(LevelFilter::Off))
        } else {
            builder.build(Root::builder().appenders(appenders).build(level))
        };
        config.map_err(|e| ImportIdSetLibError::LoggerError(e.to_string()))
    }
}

/// Installs the log4rs logger, or swaps its config if one is already running.
pub fn init_logger(logger_config: &LoggerConfig) -> Result<(), ImportIdSetLibError> {
    let config = logger_config.build_logger_config()?;
    let mut guard = LOG4RS_HANDLE.lock();
    if let Some(handle) = guard.as_ref() {
        handle.set_config(config);
        return Ok(());
    }
    let handle = log4rs::init_config(config).map_err(|e| ImportIdSetLibError::LoggerError(e.to_string()))?;
    *guard = Some(handle);
    Ok(())
}
