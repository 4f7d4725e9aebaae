//! # Proceso por Conexión
//! src/dispatch/fork.rs
//!
//! Cada conexión aceptada se atiende en un proceso hijo creado con fork().
//! El hijo cierra sus copias de los listeners, atiende un request y termina;
//! el padre suelta su copia del socket y recoge a los hijos que ya
//! terminaron sin bloquearse.
//!
//! Las estadísticas tienen que vivir en memoria compartida (`SharedStats`):
//! un contador en la memoria del hijo desaparece con él.

use super::{Connection, Dispatcher};
use crate::error::{ServerError, ServerResult};
use crate::server::handler::handle_connection;
use crate::server::ServerContext;
use std::io;
use std::net::TcpListener;
use std::os::fd::{AsRawFd, RawFd};
use tracing::{debug, warn};

pub struct ForkDispatcher {
    ctx: ServerContext,

    /// Descriptores de escucha que el hijo debe cerrar
    listener_fds: Vec<RawFd>,
}

impl ForkDispatcher {
    pub fn new(ctx: ServerContext, listeners: &[TcpListener]) -> Self {
        Self {
            ctx,
            listener_fds: listeners.iter().map(|l| l.as_raw_fd()).collect(),
        }
    }

    fn run_child(&self, conn: Connection) -> ! {
        for fd in &self.listener_fds {
            // SAFETY: copias heredadas del padre; el hijo no vuelve a usarlas.
            unsafe {
                libc::close(*fd);
            }
        }

        handle_connection(conn, &self.ctx);
        std::process::exit(0)
    }
}

impl Dispatcher for ForkDispatcher {
    fn dispatch(&mut self, conn: Connection) -> ServerResult<()> {
        // SAFETY: el acceptor de la variante fork es single-threaded; el hijo
        // solo usa la conexión, el contexto y la región compartida.
        let pid = unsafe { libc::fork() };

        match pid {
            -1 => Err(ServerError::Fork(io::Error::last_os_error())),
            0 => self.run_child(conn),
            child => {
                debug!(child, peer = %conn.peer, "Conexión delegada a proceso hijo");
                drop(conn);

                let reaped = reap_children();
                if reaped > 0 {
                    debug!(reaped, "Procesos hijos recogidos");
                }
                Ok(())
            }
        }
    }
}

/// Recoge a todos los hijos terminados sin bloquear
///
/// Retorna cuántos se recogieron. No tener hijos (ECHILD) no es un error.
pub fn reap_children() -> usize {
    let mut reaped = 0;

    loop {
        let mut status: libc::c_int = 0;
        // SAFETY: waitpid solo escribe en `status`.
        let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG) };

        if pid > 0 {
            reaped += 1;
            continue;
        }

        if pid < 0 {
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::ECHILD) => {}
                _ => warn!(error = %err, "waitpid() falló"),
            }
        }

        return reaped;
    }
}

