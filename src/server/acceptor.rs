//! # Acceptor Multi-Puerto
//! src/server/acceptor.rs
//!
//! Espera readiness sobre todos los listeners a la vez con poll(), acepta
//! cada conexión pendiente y la entrega al [`Dispatcher`] configurado.
//!
//! Los listeners son no bloqueantes: un puerto listo se drena hasta
//! `WouldBlock` y nunca se queda colgado en accept(). Los sockets aceptados
//! vuelven a modo bloqueante antes de despacharse.
//!
//! El self-pipe de [`DumpSignal`] está en el mismo set de poll(); el pedido
//! de volcado se revisa antes de cada espera, al despertar por el pipe y
//! cada vez que una señal interrumpe la espera.

use super::signal::DumpSignal;
use crate::dispatch::{Connection, Dispatcher};
use crate::error::{ServerError, ServerResult};
use crate::stats::{StatsSnapshot, StatsStore};
use std::convert::Infallible;
use std::io::{self, ErrorKind};
use std::net::TcpListener;
use std::os::fd::AsRawFd;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Acceptor {
    listeners: Vec<TcpListener>,
    dump: DumpSignal,
    stats: Arc<dyn StatsStore>,
}

impl Acceptor {
    pub fn new(
        listeners: Vec<TcpListener>,
        dump: DumpSignal,
        stats: Arc<dyn StatsStore>,
    ) -> ServerResult<Self> {
        for listener in &listeners {
            listener.set_nonblocking(true).map_err(|source| ServerError::Listen {
                port: listener.local_addr().map(|a| a.port()).unwrap_or(0),
                source,
            })?;
        }

        Ok(Self {
            listeners,
            dump,
            stats,
        })
    }

    /// Acepta para siempre; solo retorna con un error fatal
    pub fn run(&mut self, dispatcher: &mut dyn Dispatcher) -> ServerResult<Infallible> {
        loop {
            self.run_once(dispatcher)?;
        }
    }

    /// Una vuelta: volcado pendiente, espera, y drenado de los puertos listos
    ///
    /// Retorna cuántas conexiones se despacharon.
    pub fn run_once(&mut self, dispatcher: &mut dyn Dispatcher) -> ServerResult<usize> {
        self.dump_if_requested();

        let (ready, woken) = match self.wait_readable() {
            Ok(ready) => ready,
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                self.dump_if_requested();
                return Ok(0);
            }
            Err(e) => return Err(ServerError::Poll(e)),
        };

        if woken {
            self.dump.drain_wake();
            self.dump_if_requested();
        }

        let mut dispatched = 0;
        for index in ready {
            dispatched += self.drain(index, dispatcher)?;
        }
        Ok(dispatched)
    }

    /// Escribe el snapshot en el log si el operador lo pidió
    pub fn dump_if_requested(&self) -> Option<StatsSnapshot> {
        if !self.dump.take() {
            return None;
        }

        let snapshot = self.stats.snapshot();
        info!(
            count_2xx = snapshot.two_xx,
            count_3xx = snapshot.three_xx,
            count_4xx = snapshot.four_xx,
            count_5xx = snapshot.five_xx,
            sum = snapshot.sum(),
            "Request statistics"
        );
        Some(snapshot)
    }

    /// Bloquea hasta que haya conexiones pendientes o un pedido de volcado
    ///
    /// Retorna los índices de listeners listos y si despertó el self-pipe.
    fn wait_readable(&self) -> io::Result<(Vec<usize>, bool)> {
        let mut fds: Vec<libc::pollfd> = self
            .listeners
            .iter()
            .map(|listener| listener.as_raw_fd())
            .chain(self.dump.wake_fd())
            .map(|fd| libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();

        // SAFETY: `fds` es un arreglo válido de `fds.len()` pollfd.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        let mut ready: Vec<usize> = fds
            .iter()
            .enumerate()
            .filter(|(_, p)| p.revents & (libc::POLLIN | libc::POLLERR | libc::POLLHUP) != 0)
            .map(|(index, _)| index)
            .collect();

        let wake_index = self.listeners.len();
        let woken = ready.last() == Some(&wake_index);
        if woken {
            ready.pop();
        }
        Ok((ready, woken))
    }

    fn drain(&self, index: usize, dispatcher: &mut dyn Dispatcher) -> ServerResult<usize> {
        let listener = &self.listeners[index];
        let mut dispatched = 0;

        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nonblocking(false) {
                        warn!(peer = %peer, error = %e, "No se pudo configurar el socket; conexión descartada");
                        continue;
                    }
                    debug!(peer = %peer, listener = index, "Nueva conexión");
                    dispatcher.dispatch(Connection { stream, peer })?;
                    dispatched += 1;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    self.dump_if_requested();
                }
                Err(e) if e.kind() == ErrorKind::ConnectionAborted => {
                    warn!(error = %e, "El cliente abortó antes de accept()");
                }
                Err(e) => return Err(ServerError::Accept(e)),
            }
        }

        Ok(dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusClass;
    use crate::stats::LocalStats;
    use std::io::Read;
    use std::net::{SocketAddr, TcpStream};
    use std::thread;
    use std::time::Duration;

    /// Guarda las conexiones en vez de atenderlas
    #[derive(Default)]
    struct Recorder {
        peers: Vec<SocketAddr>,
        streams: Vec<TcpStream>,
    }

    impl Dispatcher for Recorder {
        fn dispatch(&mut self, conn: Connection) -> ServerResult<()> {
            self.peers.push(conn.peer);
            self.streams.push(conn.stream);
            Ok(())
        }
    }

    fn bind_local() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").unwrap()
    }

    fn acceptor(listeners: Vec<TcpListener>, dump: DumpSignal) -> (Acceptor, Arc<LocalStats>) {
        let stats = Arc::new(LocalStats::new());
        let acceptor = Acceptor::new(listeners, dump, stats.clone()).unwrap();
        (acceptor, stats)
    }

    #[test]
    fn test_accepts_on_every_listener() {
        let first = bind_local();
        let second = bind_local();
        let addrs = [first.local_addr().unwrap(), second.local_addr().unwrap()];
        let (mut acceptor, _) = acceptor(vec![first, second], DumpSignal::new());

        let clients: Vec<TcpStream> = addrs
            .iter()
            .flat_map(|addr| [TcpStream::connect(addr).unwrap(), TcpStream::connect(addr).unwrap()])
            .collect();

        let mut recorder = Recorder::default();
        while recorder.peers.len() < clients.len() {
            acceptor.run_once(&mut recorder).unwrap();
        }

        let mut expected: Vec<SocketAddr> = clients.iter().map(|c| c.local_addr().unwrap()).collect();
        let mut seen = recorder.peers.clone();
        expected.sort();
        seen.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_accepted_streams_are_blocking() {
        let listener = bind_local();
        let addr = listener.local_addr().unwrap();
        let (mut acceptor, _) = acceptor(vec![listener], DumpSignal::new());

        let client = TcpStream::connect(addr).unwrap();
        let mut recorder = Recorder::default();
        while recorder.streams.is_empty() {
            acceptor.run_once(&mut recorder).unwrap();
        }

        // Un socket no bloqueante retornaría WouldBlock; aquí read()
        // espera hasta que el cliente cierra.
        drop(client);
        let mut buf = [0u8; 8];
        assert_eq!(recorder.streams[0].read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_dump_reports_snapshot_once() {
        let dump = DumpSignal::new();
        let (acceptor, stats) = acceptor(vec![bind_local()], dump.clone());
        stats.increment(StatusClass::Success);
        stats.increment(StatusClass::ClientError);

        assert_eq!(acceptor.dump_if_requested(), None);

        dump.request();
        let snapshot = acceptor.dump_if_requested().unwrap();
        assert_eq!(snapshot.two_xx, 1);
        assert_eq!(snapshot.four_xx, 1);
        assert_eq!(snapshot.sum(), 2);

        assert_eq!(acceptor.dump_if_requested(), None);
    }

    #[test]
    fn test_dump_request_wakes_idle_acceptor() {
        let dump = DumpSignal::with_wake_pipe().unwrap();
        let (mut acceptor, _) = acceptor(vec![bind_local()], dump.clone());

        // Sin conexiones: solo el self-pipe puede terminar la espera
        let requester = {
            let dump = dump.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                dump.request();
            })
        };

        let mut recorder = Recorder::default();
        assert_eq!(acceptor.run_once(&mut recorder).unwrap(), 0);
        requester.join().unwrap();

        assert!(recorder.peers.is_empty());
        assert!(!dump.take());
    }

    #[test]
    fn test_pending_dump_is_consumed_before_waiting() {
        let listener = bind_local();
        let addr = listener.local_addr().unwrap();
        let dump = DumpSignal::new();
        let (mut acceptor, _) = acceptor(vec![listener], dump.clone());

        dump.request();
        let _client = TcpStream::connect(addr).unwrap();
        let mut recorder = Recorder::default();
        while recorder.peers.is_empty() {
            acceptor.run_once(&mut recorder).unwrap();
        }

        assert!(!dump.take());
    }
}
