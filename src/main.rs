//! # Multi Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, inicializa el logging y arranca el servidor.
//! Cualquier error de arranque termina con código de salida 1.

use multi_server::config::Config;
use multi_server::logging;
use multi_server::server::Server;
use tracing::error;

fn main() {
    let config = Config::new();

    if let Err(e) = logging::init(&config.log_level) {
        eprintln!("multi_server: {}", e);
        std::process::exit(1);
    }

    let mut server = Server::new(config);

    // Solo retorna si algo falló
    if let Err(e) = server.run() {
        error!("Error fatal: {}", e);
        std::process::exit(1);
    }
}
