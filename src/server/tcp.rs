//! # Servidor TCP Multi-Puerto
//! src/server/tcp.rs
//!
//! Arma el servidor a partir de la configuración:
//!
//! 1. Valida la configuración y abre un listener por puerto
//! 2. Elige el store de estadísticas según la estrategia
//! 3. Instala el handler de SIGUSR1
//! 4. Arranca el acceptor con el dispatcher correspondiente

use super::acceptor::Acceptor;
use super::context::ServerContext;
use super::signal::DumpSignal;
use crate::config::{Config, Strategy};
use crate::dispatch::{ForkDispatcher, PoolDispatcher};
use crate::error::{ServerError, ServerResult};
use crate::stats::{LocalStats, SharedStats, StatsStore};
use std::convert::Infallible;
use std::net::TcpListener;
use std::sync::Arc;
use tracing::info;

/// Servidor HTTP/1.0 de archivos estáticos
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Abre un listener por cada puerto configurado
    ///
    /// Cualquier puerto que no se pueda bindear aborta el arranque.
    pub fn bind(&self) -> ServerResult<Vec<TcpListener>> {
        self.config
            .ports
            .iter()
            .map(|&port| {
                let address = self.config.address(port);
                let listener =
                    TcpListener::bind(&address).map_err(|source| ServerError::Bind { port, source })?;
                info!("Servidor escuchando en {}", address);
                Ok(listener)
            })
            .collect()
    }

    /// Arranca el servidor; solo retorna con un error fatal
    pub fn run(&mut self) -> ServerResult<Infallible> {
        self.config.validate()?;
        self.config.log_summary();
        ignore_sigpipe();

        let listeners = self.bind()?;
        let dump = DumpSignal::register()?;

        match self.config.strategy {
            Strategy::Fork => {
                let stats: Arc<dyn StatsStore> = Arc::new(SharedStats::new()?);
                let mut dispatcher = ForkDispatcher::new(self.context(Arc::clone(&stats)), &listeners);
                Acceptor::new(listeners, dump, stats)?.run(&mut dispatcher)
            }
            Strategy::Pool => {
                let stats: Arc<dyn StatsStore> = Arc::new(LocalStats::new());
                let mut dispatcher =
                    PoolDispatcher::new(self.config.workers, self.context(Arc::clone(&stats)))?;
                Acceptor::new(listeners, dump, stats)?.run(&mut dispatcher)
            }
        }
    }

    fn context(&self, stats: Arc<dyn StatsStore>) -> ServerContext {
        ServerContext::new(
            self.config.web_root.clone(),
            self.config.directory_policy,
            stats,
        )
    }
}

/// Un cliente que cierra a mitad de respuesta se reporta como error de
/// escritura en vez de terminar el proceso
fn ignore_sigpipe() {
    // SAFETY: SIG_IGN es un disposition válido para SIGPIPE.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}
