//! # Estrategias de Despacho
//! src/dispatch/mod.rs
//!
//! Cómo llega una conexión aceptada a la unidad que la atiende:
//!
//! ```text
//!                     ┌─ ForkDispatcher ─→ fork() ─→ hijo: handle_connection
//! Acceptor ─→ dispatch┤
//!                     └─ PoolDispatcher ─→ BlockingQueue ─→ worker N: handle_connection
//! ```
//!
//! Las dos estrategias son intercambiables detrás de [`Dispatcher`].

pub mod fork;
pub mod pool;
pub mod queue;

pub use fork::ForkDispatcher;
pub use pool::{PoolDispatcher, WorkerPool};
pub use queue::BlockingQueue;

use crate::error::ServerResult;
use std::net::{SocketAddr, TcpStream};

/// Socket aceptado y dirección del peer
///
/// Tiene un único dueño a la vez; soltarlo cierra la conexión.
#[derive(Debug)]
pub struct Connection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

/// Política que entrega cada conexión a una unidad de trabajo
pub trait Dispatcher {
    /// Toma posesión de la conexión
    ///
    /// Un error aquí es fatal para el servidor (fork imposible, etc.).
    fn dispatch(&mut self, conn: Connection) -> ServerResult<()>;
}
