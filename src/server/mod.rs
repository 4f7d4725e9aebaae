//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! - `tcp`: arranque, listeners y elección de estrategia
//! - `acceptor`: loop de poll()/accept() sobre todos los puertos
//! - `handler`: state machine de un request
//! - `context`: estado compartido por las unidades de despacho
//! - `signal`: volcado de estadísticas con SIGUSR1

pub mod acceptor;
pub mod context;
pub mod handler;
pub mod signal;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use acceptor::Acceptor;
pub use context::ServerContext;
pub use tcp::Server;
