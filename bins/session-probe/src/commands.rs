use crate::logging::LoggingStyle;
use app_config::HandlerKind;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

pub fn build_command() -> Command {
    Command::new("session-probe")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Markus Mayer")
        .about("Checks the memcache session storage configuration")
        .arg(
            Arg::new("logging_style")
                .long("log")
                .env("APP_LOG_STYLE")
                .value_name("STYLE")
                .default_value("simple")
                .help("The logging style to use (simple, json)")
                .num_args(1)
                .value_parser(logging_style)
                .help_heading("Logging"),
        )
        .arg(
            Arg::new("config_file")
                .long("config")
                .env("APP_CONFIG_FILE")
                .value_name("FILE")
                .help("An additional YAML configuration file to load")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .help_heading("Configuration"),
        )
        .arg(
            Arg::new("handler")
                .long("handler")
                .env("APP_SESSION_HANDLER")
                .value_name("BINDING")
                .help("Overrides the configured session handler (memcache, memcached)")
                .num_args(1)
                .value_parser(handler_kind)
                .help_heading("Session"),
        )
        .arg(
            Arg::new("probe")
                .long("probe")
                .help("Writes, reads back and destroys a probe session")
                .action(ArgAction::SetTrue)
                .help_heading("Session"),
        )
}

fn logging_style(s: &str) -> Result<LoggingStyle, String> {
    match s {
        "simple" => Ok(LoggingStyle::Compact),
        "compact" => Ok(LoggingStyle::Compact),
        "json" => Ok(LoggingStyle::Json),
        _ => Err(String::from("Either simple or json must be specified")),
    }
}

fn handler_kind(s: &str) -> Result<HandlerKind, String> {
    match s {
        "memcache" => Ok(HandlerKind::Memcache),
        "memcached" => Ok(HandlerKind::Memcached),
        _ => Err(String::from("Either memcache or memcached must be specified")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_valid() {
        build_command().debug_assert();
    }

    #[test]
    fn handler_override_works() {
        let matches = build_command()
            .try_get_matches_from(["session-probe", "--handler", "memcached", "--probe"])
            .expect("Failed to parse arguments");

        assert_eq!(
            matches.get_one::<HandlerKind>("handler"),
            Some(&HandlerKind::Memcached)
        );
        assert!(matches.get_flag("probe"));
    }

    #[test]
    fn unknown_handler_is_rejected() {
        let result =
            build_command().try_get_matches_from(["session-probe", "--handler", "redis"]);
        assert!(result.is_err());
    }
}
