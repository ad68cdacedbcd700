use crate::SessionHandler;
use std::ops::Deref;

/// `DynSessionHandler` is a wrapper struct that holds a boxed trait object,
/// enabling dynamic dispatch for different implementations of the
/// [`SessionHandler`] trait.
///
/// # Example
///
/// ```
/// use session_traits::{DynSessionHandler, SessionHandler, SessionHandlerError};
///
/// struct NullHandler;
///
/// impl SessionHandler for NullHandler {
///     fn open(&self, _: &str, _: &str) -> Result<bool, SessionHandlerError> { Ok(true) }
///     fn close(&self) -> Result<bool, SessionHandlerError> { Ok(true) }
///     fn read(&self, _: &str) -> Result<Vec<u8>, SessionHandlerError> { Ok(Vec::new()) }
///     fn write(&self, _: &str, _: &[u8]) -> Result<bool, SessionHandlerError> { Ok(true) }
///     fn destroy(&self, _: &str) -> Result<bool, SessionHandlerError> { Ok(true) }
///     fn gc(&self, _: u64) -> Result<bool, SessionHandlerError> { Ok(true) }
/// }
///
/// let handler = DynSessionHandler::from(Box::new(NullHandler));
/// assert!(handler.read("abc").unwrap().is_empty());
/// ```
pub struct DynSessionHandler(Box<dyn SessionHandler>);

impl DynSessionHandler {
    pub fn new<T>(h: Box<T>) -> Self
    where
        T: SessionHandler + 'static,
    {
        DynSessionHandler(h)
    }
}

impl Deref for DynSessionHandler {
    type Target = dyn SessionHandler;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<T> From<Box<T>> for DynSessionHandler
where
    T: SessionHandler + 'static,
{
    fn from(h: Box<T>) -> Self {
        DynSessionHandler::new(h)
    }
}
