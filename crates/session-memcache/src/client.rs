use crate::server_list::{MemcacheServerListWrapper, ServerList};
use r2d2::Pool;
use r2d2_memcache::memcache::MemcacheError;
use r2d2_memcache::MemcacheConnectionManager;
use std::error::Error;
use tracing::trace;

/// The operations the session handler needs from a cache client.
pub trait CacheClient: Send + Sync {
    type Error: Error + Send + Sync + 'static;

    /// Gets the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Stores `value` under `key`. See [`CacheSessionHandler`](crate::CacheSessionHandler)
    /// for the meaning of `expiration`.
    fn set(&self, key: &str, value: &[u8], expiration: u32) -> Result<(), Self::Error>;

    /// Removes `key`, returning whether it existed.
    fn delete(&self, key: &str) -> Result<bool, Self::Error>;
}

/// A pool of memcache clients, each connected to all registered servers.
pub struct MemcachePool {
    /// The connection pool
    pool: Pool<MemcacheConnectionManager>,
    /// The number of registered servers.
    servers: usize,
}

impl MemcachePool {
    /// Creates the pool. Connections are established on first use.
    pub fn connect(servers: &ServerList) -> Result<Self, MemcachePoolError> {
        let manager = MemcacheConnectionManager::new(MemcacheServerListWrapper::from(servers));

        // Persistent servers keep a connection around between requests.
        let min_idle = if servers.any_persistent() { 1 } else { 0 };
        let pool = Pool::builder()
            .min_idle(Some(min_idle))
            .build_unchecked(manager);

        Ok(Self {
            pool,
            servers: servers.len(),
        })
    }

    /// Gets the number of registered servers.
    pub fn server_count(&self) -> usize {
        self.servers
    }

    fn client(&self) -> Result<r2d2::PooledConnection<MemcacheConnectionManager>, MemcachePoolError> {
        if self.server_count() == 0 {
            return Err(MemcachePoolError::NoServers);
        }
        Ok(self.pool.get()?)
    }
}

impl CacheClient for MemcachePool {
    type Error = MemcachePoolError;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let value: Option<Vec<u8>> = self.client()?.get(key)?;
        trace!(
            "Looked up key {key}: {found}",
            found = if value.is_some() { "hit" } else { "miss" }
        );
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8], expiration: u32) -> Result<(), Self::Error> {
        self.client()?.set(key, value, expiration)?;
        trace!("Stored data under key {key} with expiration {expiration}");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, Self::Error> {
        let existed = self.client()?.delete(key)?;
        trace!("Deleted key {key}");
        Ok(existed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MemcachePoolError {
    #[error("No memcache servers are configured")]
    NoServers,
    #[error("Failed to obtain a pooled connection")]
    Pool(#[from] r2d2::Error),
    #[error(transparent)]
    Memcache(#[from] MemcacheError),
}
