use std::error::Error;

use log::LevelFilter;
use log4rs::append::console::Target;
use log4rs::append::file::FileAppender;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};

use crate::configure::GeocoderConfig;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}";

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info, // Default to Info
    }
}

/// Console (stderr) appender, plus a file appender when `log_to_file` is set
pub fn build_log_config(config: &GeocoderConfig) -> Result<LogConfig, Box<dyn Error>> {
    // stdout is left to command output
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let mut log_config_builder = LogConfig::builder()
        .appender(Appender::builder().build("console", Box::new(console)));

    let mut root_builder = Root::builder().appender("console");

    // Conditionally add file appender
    if config.log_to_file {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(&config.log_file)?;

        log_config_builder = log_config_builder
            .appender(Appender::builder().build("file", Box::new(file)));

        root_builder = root_builder.appender("file");
    }

    Ok(log_config_builder.build(root_builder.build(parse_level(&config.log_level)))?)
}

pub fn setup_logger(config: &GeocoderConfig) -> Result<(), Box<dyn Error>> {
    let log_config = build_log_config(config)?;

    // Initialize the logger
    log4rs::init_config(log_config)?;

    if config.log_to_file {
        log::info!("Logging to file: {}", config.log_file);
    }

    Ok(())
}
