//! # Errores del Servidor
//! src/error.rs
//!
//! Errores fatales de arranque e infraestructura. Cualquiera de ellos
//! termina el proceso con código de salida 1; los errores de protocolo
//! de una conexión viven en `http::request::RequestError` y nunca llegan aquí.

use std::io;
use thiserror::Error;

/// Error fatal: el servidor no puede seguir funcionando
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuración inválida (CLI o variables de entorno)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No se pudo crear/bindear un socket de escucha
    #[error("bind() failed on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// No se pudo preparar un listener ya bindeado (modo no bloqueante)
    #[error("could not configure listening socket on port {port}: {source}")]
    Listen {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Falló la espera de readiness sobre los listeners
    #[error("poll() failed: {0}")]
    Poll(#[source] io::Error),

    /// Falló accept() por algo distinto a una interrupción
    #[error("accept() failed: {0}")]
    Accept(#[source] io::Error),

    #[error("fork() failed: {0}")]
    Fork(#[source] io::Error),

    /// No se pudo mapear la región compartida de estadísticas
    #[error("mmap() of the shared statistics region failed: {0}")]
    SharedMemory(#[source] io::Error),

    #[error("semaphore initialization failed: {0}")]
    Semaphore(#[source] io::Error),

    /// No se pudo instalar el handler de la señal del operador
    #[error("signal registration failed: {0}")]
    Signal(#[source] io::Error),

    #[error("could not spawn worker thread {index}: {source}")]
    ThreadSpawn {
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error("logging initialization failed: {0}")]
    Logging(String),
}

pub type ServerResult<T> = Result<T, ServerError>;
