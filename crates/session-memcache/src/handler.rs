use crate::client::CacheClient;
use app_config::HandlerOptions;
use session_traits::{SessionHandler, SessionHandlerError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

/// Memcached treats expiration times beyond 30 days as UNIX timestamps.
const MAX_RELATIVE_EXPIRATION_SECS: u64 = 60 * 60 * 24 * 30;

/// A session handler storing sessions in a cache.
///
/// Sessions are stored under the configured prefix followed by the session ID
/// and expire after the configured expiration time. Garbage collection is left
/// to the cache.
pub struct CacheSessionHandler<C> {
    client: C,
    options: HandlerOptions,
}

impl<C> CacheSessionHandler<C>
where
    C: CacheClient,
{
    pub fn new(client: C, options: HandlerOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}{}", self.options.prefix(), session_id)
    }

    /// Gets the expiration value sent with every write.
    fn expiration(&self) -> u32 {
        let ttl = self.options.expiration().as_secs();
        if ttl <= MAX_RELATIVE_EXPIRATION_SECS {
            return ttl as u32;
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        now.saturating_add(ttl).min(u32::MAX as _) as u32
    }
}

impl<C> SessionHandler for CacheSessionHandler<C>
where
    C: CacheClient,
{
    fn open(&self, save_path: &str, name: &str) -> Result<bool, SessionHandlerError> {
        trace!("Opening session {name} at {save_path}");
        Ok(true)
    }

    fn close(&self) -> Result<bool, SessionHandlerError> {
        Ok(true)
    }

    fn read(&self, session_id: &str) -> Result<Vec<u8>, SessionHandlerError> {
        let data = self
            .client
            .get(&self.key(session_id))
            .map_err(SessionHandlerError::backend_specific)?;
        Ok(data.unwrap_or_default())
    }

    fn write(&self, session_id: &str, data: &[u8]) -> Result<bool, SessionHandlerError> {
        self.client
            .set(&self.key(session_id), data, self.expiration())
            .map_err(SessionHandlerError::backend_specific)?;
        Ok(true)
    }

    fn destroy(&self, session_id: &str) -> Result<bool, SessionHandlerError> {
        let existed = self
            .client
            .delete(&self.key(session_id))
            .map_err(SessionHandlerError::backend_specific)?;
        if !existed {
            debug!("Session {session_id} was already gone");
        }
        Ok(true)
    }

    fn gc(&self, _max_lifetime: u64) -> Result<bool, SessionHandlerError> {
        // Entries expire on their own.
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryClient;

    fn handler(options: HandlerOptions) -> CacheSessionHandler<InMemoryClient> {
        CacheSessionHandler::new(InMemoryClient::default(), options)
    }

    #[test]
    fn unknown_session_reads_empty() {
        let handler = handler(HandlerOptions::default());
        assert!(handler.open("", "PHPSESSID").unwrap());
        assert!(handler.read("missing").unwrap().is_empty());
        assert!(handler.close().unwrap());
    }

    #[test]
    fn write_then_read_works() {
        let handler = handler(HandlerOptions {
            expiretime: Some(300),
            prefix: Some(String::from("sess_")),
        });

        assert!(handler.write("abc", b"user|i:1;").unwrap());
        assert_eq!(handler.read("abc").unwrap(), b"user|i:1;");

        let stored = handler.client().entry("sess_abc").expect("Entry missing");
        assert_eq!(stored, (b"user|i:1;".to_vec(), 300));
    }

    #[test]
    fn default_prefix_and_expiration_apply() {
        let handler = handler(HandlerOptions::default());
        handler.write("abc", b"data").unwrap();

        let (_, expiration) = handler.client().entry("sf2sabc").expect("Entry missing");
        assert_eq!(expiration, 86400);
    }

    #[test]
    fn long_expiration_becomes_timestamp() {
        let handler = handler(HandlerOptions {
            expiretime: Some(60 * 60 * 24 * 40),
            prefix: None,
        });

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert!(handler.expiration() as u64 >= now + 60 * 60 * 24 * 40);
    }

    #[test]
    fn destroy_works() {
        let handler = handler(HandlerOptions::default());
        handler.write("abc", b"data").unwrap();

        assert!(handler.destroy("abc").unwrap());
        assert!(handler.read("abc").unwrap().is_empty());
        assert!(handler.destroy("abc").unwrap());
    }

    #[test]
    fn gc_is_a_no_op() {
        let handler = handler(HandlerOptions::default());
        handler.write("abc", b"data").unwrap();

        assert!(handler.gc(0).unwrap());
        assert_eq!(handler.read("abc").unwrap(), b"data");
    }

    #[test]
    fn client_errors_propagate() {
        let handler = handler(HandlerOptions::default());
        handler.client().fail_next();

        let error = handler.read("abc").expect_err("Read should fail");
        assert!(matches!(error, SessionHandlerError::BackendSpecific(_)));
    }
}
