use crate::{DynSessionHandler, HandlerInfo};
use app_config::AppConfig;
use std::error::Error;

/// Creates a session handler from the application configuration.
pub trait TryCreateFromConfig: HandlerInfo
where
    Self::Error: Error + 'static,
{
    type Error;

    fn try_from_config(config: &AppConfig) -> Result<DynSessionHandler, Self::Error>;
}
