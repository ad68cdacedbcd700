use clap::ArgMatches;
use std::borrow::Borrow;
use tracing::metadata::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum LoggingStyle {
    /// Uses compact logging.
    #[default]
    Compact,
    /// Uses JSON formatted logging
    Json,
}

/// Initializes the tracing and logging system from arguments.
///
/// This method uses the default environment filter to configure logging.
/// Please use the `RUST_LOG` environment variable to tune.
///
/// ## Arguments
/// * `matches` - The clap argument matches.
pub fn initialize_from_matches<M: Borrow<ArgMatches>>(matches: M) {
    let style = matches
        .borrow()
        .get_one::<LoggingStyle>("logging_style")
        .copied()
        .unwrap_or_default();
    initialize(style)
}

/// Initializes the tracing and logging system.
///
/// ## Arguments
/// * `style` - The logging style to use.
pub fn initialize<S: Borrow<LoggingStyle>>(style: S) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let formatter = tracing_subscriber::fmt()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_env_filter(filter);

    match style.borrow() {
        LoggingStyle::Compact => formatter.init(),
        LoggingStyle::Json => formatter.json().init(),
    }
}
