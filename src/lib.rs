//! # Multi Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de archivos estáticos que escucha en varios puertos a
//! la vez y reparte las conexiones con una de dos estrategias: un proceso
//! hijo por conexión, o un pool fijo de threads alimentado por una cola
//! bloqueante.
//!
//! ## Arquitectura
//!
//! - `config`: CLI y variables de entorno
//! - `http`: request line, respuestas y códigos de estado
//! - `files`: resolución de targets, copia de archivos y listados
//! - `stats`: contadores por clase de estado (en proceso o compartidos)
//! - `dispatch`: estrategias fork y pool
//! - `server`: acceptor multi-puerto, state machine de requests, señales
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use multi_server::config::Config;
//! use multi_server::server::Server;
//! use clap::Parser;
//!
//! let config = Config::parse_from(["multi_server", "8080", "./www"]);
//! let mut server = Server::new(config);
//! if let Err(e) = server.run() {
//!     eprintln!("{}", e);
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod files;
pub mod http;
pub mod logging;
pub mod server;
pub mod stats;
