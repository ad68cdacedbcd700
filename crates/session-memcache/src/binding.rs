use crate::client::{CacheClient, MemcachePool, MemcachePoolError};
use crate::descriptor::ConnectionDescriptor;
use crate::factory::{self, CreateHandlerError, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT};
use crate::handler::CacheSessionHandler;
use crate::parser::ParseStrategy;
use crate::server_list::{ServerEntry, ServerList, Transport, UnsupportedScheme};
use app_config::{AppConfig, SessionOptions};
use session_traits::{DynSessionHandler, HandlerInfo, TryCreateFromConfig};
use std::error::Error;

/// Describes how descriptors are registered with a cache client library.
pub trait ClientBinding: HandlerInfo {
    type Client: CacheClient + 'static;
    type Error: Error + Send + Sync + 'static;

    /// Gets the strategy used to decode `save_path` strings.
    fn parse_strategy() -> ParseStrategy;

    /// Maps a descriptor to a server entry, applying the binding's fallbacks.
    fn server_entry(descriptor: &ConnectionDescriptor) -> Result<ServerEntry, UnsupportedScheme>;

    /// Builds the client from the registered servers.
    fn connect(servers: ServerList) -> Result<Self::Client, Self::Error>;

    /// Creates a session handler from the session options.
    fn create(
        options: &SessionOptions,
    ) -> Result<CacheSessionHandler<Self::Client>, CreateHandlerError>
    where
        Self: Sized,
    {
        factory::create::<Self>(options)
    }
}

/// The binding reading `save_path` as URIs, with support for credentials,
/// persistence, weights and timeouts.
pub struct Memcache;

/// The binding reading `save_path` as `host:port` pairs, with support for
/// weights only.
pub struct Memcached;

/// The session handler created by both memcache bindings.
pub type MemcacheSessionHandler = CacheSessionHandler<MemcachePool>;

impl HandlerInfo for Memcache {
    fn handler_name() -> &'static str {
        "Memcache"
    }

    fn handler_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

impl ClientBinding for Memcache {
    type Client = MemcachePool;
    type Error = MemcachePoolError;

    fn parse_strategy() -> ParseStrategy {
        ParseStrategy::Uri
    }

    fn server_entry(descriptor: &ConnectionDescriptor) -> Result<ServerEntry, UnsupportedScheme> {
        let mut server = address(descriptor);
        server.transport = descriptor.scheme.parse::<Transport>()?;
        server.path = descriptor.path.clone();
        server.username = descriptor.username.clone();
        server.password = descriptor.password.clone();
        server.persistent = descriptor.persistent.unwrap_or(false);
        server.weight = descriptor.weight.unwrap_or(0);
        server.timeout = Some(descriptor.timeout.unwrap_or(DEFAULT_TIMEOUT));
        Ok(server)
    }

    fn connect(servers: ServerList) -> Result<MemcachePool, MemcachePoolError> {
        MemcachePool::connect(&servers)
    }
}

impl TryCreateFromConfig for Memcache {
    type Error = CreateHandlerError;

    fn try_from_config(config: &AppConfig) -> Result<DynSessionHandler, CreateHandlerError> {
        let handler = Self::create(&config.session.options)?;
        Ok(DynSessionHandler::from(Box::new(handler)))
    }
}

impl HandlerInfo for Memcached {
    fn handler_name() -> &'static str {
        "Memcached"
    }

    fn handler_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

impl ClientBinding for Memcached {
    type Client = MemcachePool;
    type Error = MemcachePoolError;

    fn parse_strategy() -> ParseStrategy {
        ParseStrategy::Simple
    }

    fn server_entry(descriptor: &ConnectionDescriptor) -> Result<ServerEntry, UnsupportedScheme> {
        let mut server = address(descriptor);
        server.weight = descriptor.weight.unwrap_or(0);
        Ok(server)
    }

    fn connect(servers: ServerList) -> Result<MemcachePool, MemcachePoolError> {
        MemcachePool::connect(&servers)
    }
}

impl TryCreateFromConfig for Memcached {
    type Error = CreateHandlerError;

    fn try_from_config(config: &AppConfig) -> Result<DynSessionHandler, CreateHandlerError> {
        let handler = Self::create(&config.session.options)?;
        Ok(DynSessionHandler::from(Box::new(handler)))
    }
}

/// Takes host and port, replacing blanks with the defaults.
fn address(descriptor: &ConnectionDescriptor) -> ServerEntry {
    let host = if descriptor.host.is_empty() {
        DEFAULT_HOST
    } else {
        &descriptor.host
    };
    let port = if descriptor.port == 0 {
        DEFAULT_PORT
    } else {
        descriptor.port
    };
    ServerEntry::new(host, port)
}
