// only enables the `doc_cfg` feature when
// the `docsrs` configuration attribute is defined
#![cfg_attr(docsrs, feature(doc_cfg))]

mod binding;
mod client;
mod descriptor;
mod factory;
mod handler;
mod parser;
mod server_list;

#[cfg(test)]
mod testing;

pub use binding::{ClientBinding, Memcache, MemcacheSessionHandler, Memcached};
pub use client::{CacheClient, MemcachePool, MemcachePoolError};
pub use descriptor::{ConnectionDescriptor, DEFAULT_SCHEME};
pub use factory::{create, CreateHandlerError, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use handler::CacheSessionHandler;
pub use parser::{ConnectionDescriptorParser, ParseError, ParseStrategy};
pub use server_list::{ServerEntry, ServerList, Transport, UnsupportedScheme};
