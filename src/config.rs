//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración desde argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! # Un puerto, pool de 16 threads
//! ./multi_server 8080 ./www
//!
//! # Varios puertos, un proceso por conexión, listado de directorios
//! ./multi_server --strategy fork --directory-policy list 8080 8081 ./www
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! SERVER_STRATEGY=fork SERVER_LOG=debug ./multi_server 8080 ./www
//! ```

use crate::error::{ServerError, ServerResult};
use clap::{Parser, ValueEnum};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Máximo de sockets de escucha
pub const MAX_LISTENERS: usize = 32;

/// Cómo se reparte cada conexión aceptada
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Un proceso hijo por conexión, estadísticas en memoria compartida
    Fork,
    /// N workers persistentes alimentados por una cola bloqueante
    Pool,
}

/// Qué responder cuando el target resuelve a un directorio
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectoryPolicy {
    /// 403 Forbidden
    Forbid,
    /// 200 con la salida de `ls -al`
    List,
}

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "multi_server")]
#[command(about = "Servidor HTTP/1.0 de archivos estáticos con despacho por fork o pool de threads")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puertos a escuchar (uno o más)
    #[arg(value_name = "PORT", required = true, num_args = 1..)]
    pub ports: Vec<u16>,

    /// Directorio desde el que se sirven los archivos
    #[arg(value_name = "WEB_ROOT", required = true)]
    pub web_root: PathBuf,

    /// Estrategia de despacho de conexiones
    #[arg(long, value_enum, default_value_t = Strategy::Pool, env = "SERVER_STRATEGY")]
    pub strategy: Strategy,

    /// Número de workers del pool (ignorado con --strategy fork)
    #[arg(long, default_value = "16", env = "SERVER_WORKERS")]
    pub workers: usize,

    /// Respuesta para requests que resuelven a un directorio
    #[arg(
        long = "directory-policy",
        value_enum,
        default_value_t = DirectoryPolicy::Forbid,
        env = "SERVER_DIRECTORY_POLICY"
    )]
    pub directory_policy: DirectoryPolicy,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "SERVER_HOST")]
    pub host: String,

    /// Filtro de logs (RUST_LOG tiene prioridad si está definido)
    #[arg(long = "log-level", default_value = "info", env = "SERVER_LOG")]
    pub log_level: String,
}

impl Config {
    /// Parsea argumentos CLI y variables de entorno
    ///
    /// `--help` y `--version` terminan con código 0; un argumento inválido
    /// imprime el uso y termina con código 1.
    pub fn new() -> Self {
        match Config::try_parse() {
            Ok(config) => config,
            Err(e) if !e.use_stderr() => e.exit(),
            Err(e) => {
                let _ = e.print();
                std::process::exit(1);
            }
        }
    }

    /// Dirección `host:port` de un puerto
    ///
    /// # Ejemplo
    /// ```rust
    /// use multi_server::config::Config;
    /// use clap::Parser;
    ///
    /// let config = Config::parse_from(["multi_server", "8080", "/www"]);
    /// assert_eq!(config.address(8080), "0.0.0.0:8080");
    /// ```
    pub fn address(&self, port: u16) -> String {
        format!("{}:{}", self.host, port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> ServerResult<()> {
        if self.ports.is_empty() {
            return Err(ServerError::Config("at least one port is required".to_string()));
        }
        if self.ports.len() > MAX_LISTENERS {
            return Err(ServerError::Config(format!(
                "too many listening sockets (max {})",
                MAX_LISTENERS
            )));
        }

        let mut seen = HashSet::new();
        for port in &self.ports {
            if !seen.insert(port) {
                return Err(ServerError::Config(format!("port {} listed twice", port)));
            }
        }

        if self.strategy == Strategy::Pool && self.workers == 0 {
            return Err(ServerError::Config("workers must be >= 1".to_string()));
        }

        if !self.web_root.is_dir() {
            return Err(ServerError::Config(format!(
                "web root {} is not a directory",
                self.web_root.display()
            )));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        info!(
            ports = ?self.ports,
            host = %self.host,
            web_root = %self.web_root.display(),
            "Configuración de red"
        );
        match self.strategy {
            Strategy::Fork => info!(strategy = "fork", "Un proceso por conexión"),
            Strategy::Pool => info!(strategy = "pool", workers = self.workers, "Pool de threads"),
        }
        info!(directory_policy = ?self.directory_policy, "Política de directorios");
    }
}
