use crate::binding::ClientBinding;
use crate::client::CacheClient;
use crate::descriptor::ConnectionDescriptor;
use crate::parser::ParseStrategy;
use crate::server_list::{ServerEntry, ServerList, UnsupportedScheme};
use session_traits::HandlerInfo;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A cache client keeping its entries in memory.
#[derive(Default)]
pub struct InMemoryClient {
    servers: ServerList,
    entries: Mutex<HashMap<String, (Vec<u8>, u32)>>,
    fail_next: AtomicBool,
}

#[derive(Debug, thiserror::Error)]
#[error("Simulated cache failure")]
pub struct InMemoryError;

impl InMemoryClient {
    pub fn servers(&self) -> &ServerList {
        &self.servers
    }

    pub fn entry(&self, key: &str) -> Option<(Vec<u8>, u32)> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), InMemoryError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            Err(InMemoryError)
        } else {
            Ok(())
        }
    }
}

impl CacheClient for InMemoryClient {
    type Error = InMemoryError;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        self.check()?;
        Ok(self.entry(key).map(|(value, _)| value))
    }

    fn set(&self, key: &str, value: &[u8], expiration: u32) -> Result<(), Self::Error> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), expiration));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }
}

/// A binding recording the registered servers instead of connecting.
pub struct RecordingBinding;

impl HandlerInfo for RecordingBinding {
    fn handler_name() -> &'static str {
        "Recording"
    }
}

impl ClientBinding for RecordingBinding {
    type Client = InMemoryClient;
    type Error = InMemoryError;

    fn parse_strategy() -> ParseStrategy {
        ParseStrategy::Uri
    }

    fn server_entry(descriptor: &ConnectionDescriptor) -> Result<ServerEntry, UnsupportedScheme> {
        crate::Memcache::server_entry(descriptor)
    }

    fn connect(servers: ServerList) -> Result<InMemoryClient, InMemoryError> {
        Ok(InMemoryClient {
            servers,
            ..Default::default()
        })
    }
}
