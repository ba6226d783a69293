//! Subcommand implementations.

use thiserror::Error;

/// Configure command handler.
pub mod configure;

/// Provider listing command handler.
pub mod providers;

/// Translation command handler.
pub mod translate;

/// Configuration could not be loaded or resolved.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ConfigError(#[from] pub anyhow::Error);
