use std::error::Error;

/// The session storage capability set.
///
/// Mirrors the classic session save handler contract: a session is opened,
/// read, written and closed once per request; `destroy` removes a session and
/// `gc` purges expired ones.
pub trait SessionHandler: Send + Sync {
    /// Prepares the handler for the session `name` stored at `save_path`.
    fn open(&self, save_path: &str, name: &str) -> Result<bool, SessionHandlerError>;

    /// Releases resources acquired by [`SessionHandler::open`].
    fn close(&self) -> Result<bool, SessionHandlerError>;

    /// Reads the session data. Unknown sessions yield empty data.
    fn read(&self, session_id: &str) -> Result<Vec<u8>, SessionHandlerError>;

    /// Stores the session data.
    fn write(&self, session_id: &str, data: &[u8]) -> Result<bool, SessionHandlerError>;

    /// Removes the session. Removing an unknown session succeeds.
    fn destroy(&self, session_id: &str) -> Result<bool, SessionHandlerError>;

    /// Removes sessions older than `max_lifetime` seconds.
    fn gc(&self, max_lifetime: u64) -> Result<bool, SessionHandlerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionHandlerError {
    #[error(transparent)]
    BackendSpecific(Box<dyn Error + Send + Sync>),
}

impl SessionHandlerError {
    pub fn backend_specific<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::BackendSpecific(Box::new(error))
    }
}
