use crate::binding::ClientBinding;
use crate::handler::CacheSessionHandler;
use crate::parser::{ConnectionDescriptorParser, ParseError};
use crate::server_list::{ServerList, UnsupportedScheme};
use app_config::{HandlerOptions, SessionOptions};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The host used when a connection names none.
pub const DEFAULT_HOST: &str = "localhost";

/// The port used when a connection names none.
pub const DEFAULT_PORT: u16 = 11211;

/// The per-server timeout used when a connection names none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Creates a session handler using the client binding `B`.
///
/// All connections are parsed and mapped to server entries before the first
/// server is registered; any configuration error fails the call without
/// creating a connection pool.
///
/// # Errors
///
/// Returns [`CreateHandlerError::Parse`] for malformed connections,
/// [`CreateHandlerError::UnsupportedScheme`] for schemes the binding cannot
/// serve and [`CreateHandlerError::Connect`] if the client cannot be built.
pub fn create<B>(options: &SessionOptions) -> Result<CacheSessionHandler<B::Client>, CreateHandlerError>
where
    B: ClientBinding,
{
    let parser = ConnectionDescriptorParser::new(B::parse_strategy());
    let descriptors = match parser.parse(options, DEFAULT_HOST, DEFAULT_PORT) {
        Ok(descriptors) => descriptors,
        Err(e) => {
            error!(
                "Failed to parse {binding} session storage connections: {error}",
                binding = B::handler_name(),
                error = e
            );
            return Err(e.into());
        }
    };

    let entries = descriptors
        .iter()
        .map(B::server_entry)
        .collect::<Result<Vec<_>, _>>()?;

    if entries.is_empty() {
        warn!(
            "No session storage servers configured for the {binding} session handler",
            binding = B::handler_name()
        );
    } else {
        info!(
            "Registering {count} {binding} server{plural} (handler version {handler_version})",
            count = entries.len(),
            binding = B::handler_name(),
            handler_version = B::handler_version(),
            plural = if entries.len() == 1 { "" } else { "s" }
        );
    }

    let mut servers = ServerList::default();
    for server in entries {
        debug!(
            "Adding server {server} (weight {weight}, persistent {persistent})",
            weight = server.weight,
            persistent = server.persistent
        );
        servers.add_server(server);
    }

    let client = B::connect(servers).map_err(|e| CreateHandlerError::Connect {
        binding: B::handler_name(),
        source: Box::new(e),
    })?;

    Ok(CacheSessionHandler::new(client, HandlerOptions::from(options)))
}

#[derive(Debug, thiserror::Error)]
pub enum CreateHandlerError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    UnsupportedScheme(#[from] UnsupportedScheme),
    #[error("Failed to create the {binding} client")]
    Connect {
        binding: &'static str,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}
