#![forbid(unused_must_use)]
// only enables the `doc_cfg` feature when
// the `docsrs` configuration attribute is defined
#![cfg_attr(docsrs, feature(doc_cfg))]

use app_config::{AppConfig, HandlerKind};
use directories::ProjectDirs;
use session_memcache::{CreateHandlerError, Memcache, Memcached};
use session_traits::{DynSessionHandler, SessionHandler, TryCreateFromConfig};
use shortguid::ShortGuid;
use std::process::ExitCode;
use tracing::{error, info};

mod commands;
mod logging;

/// The data written by the probe session.
const PROBE_DATA: &[u8] = b"probe|b:1;";

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let matches = commands::build_command().get_matches();
    logging::initialize_from_matches(&matches);

    let dirs = match ProjectDirs::from("io.github", "sunsided", "memcache-session") {
        Some(dirs) => dirs,
        None => {
            error!("Could not determine the project directories");
            return ExitCode::FAILURE;
        }
    };

    let mut cfg: AppConfig = match AppConfig::load(dirs.config_local_dir(), &matches) {
        Ok(config) => config,
        Err(_) => {
            return ExitCode::from(exitcode::CONFIG as u8);
        }
    };

    if let Some(handler) = matches.get_one::<HandlerKind>("handler") {
        cfg.session.handler = *handler;
    }

    let handler = match create_handler(&cfg) {
        Ok(handler) => handler,
        Err(e) => {
            error!(
                "Unable to create the {kind} session handler: {error}",
                kind = cfg.session.handler,
                error = e
            );
            return ExitCode::from(exitcode::CONFIG as u8);
        }
    };

    if matches.get_flag("probe") {
        if let Err(e) = probe(&handler) {
            error!("Session probe failed: {error:#}", error = e);
            return ExitCode::from(exitcode::UNAVAILABLE as u8);
        }
    }

    info!(
        "The {kind} session handler is ready",
        kind = cfg.session.handler
    );
    ExitCode::SUCCESS
}

fn create_handler(cfg: &AppConfig) -> Result<DynSessionHandler, CreateHandlerError> {
    match cfg.session.handler {
        HandlerKind::Memcache => Memcache::try_from_config(cfg),
        HandlerKind::Memcached => Memcached::try_from_config(cfg),
    }
}

/// Runs a full session lifecycle against the configured servers.
fn probe(handler: &DynSessionHandler) -> Result<(), anyhow::Error> {
    let session_id = format!("probe-{}", ShortGuid::new_random());

    handler.open("", "probe")?;
    handler.write(&session_id, PROBE_DATA)?;

    let data = handler.read(&session_id)?;
    if data != PROBE_DATA {
        anyhow::bail!(
            "Probe session {session_id} read back {actual} bytes instead of {expected}",
            actual = data.len(),
            expected = PROBE_DATA.len()
        );
    }

    handler.destroy(&session_id)?;
    handler.close()?;

    info!("Probe session {session_id} was written, read back and destroyed");
    Ok(())
}
