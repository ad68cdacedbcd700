// only enables the `doc_cfg` feature when
// the `docsrs` configuration attribute is defined
#![cfg_attr(docsrs, feature(doc_cfg))]

mod dyn_handler;
mod from_config;
mod handler;
mod handler_info;

pub use dyn_handler::DynSessionHandler;
pub use from_config::TryCreateFromConfig;
pub use handler::{SessionHandler, SessionHandlerError};
pub use handler_info::HandlerInfo;
