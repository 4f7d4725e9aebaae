//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing-subscriber`: formato de texto sobre stderr, filtro
//! desde `RUST_LOG` o, si no está definido, desde `--log-level`.

use crate::error::{ServerError, ServerResult};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Instala el subscriber global
///
/// Falla si el filtro es inválido o si ya había un subscriber instalado.
pub fn init(level: &str) -> ServerResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| ServerError::Logging(e.to_string()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init()
        .map_err(|e| ServerError::Logging(e.to_string()))
}
