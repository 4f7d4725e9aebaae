//! # Contexto del Servidor
//! src/server/context.rs
//!
//! Estado inmutable compartido por todas las unidades de despacho: web root,
//! política de directorios y el handle de estadísticas. Se pasa
//! explícitamente a cada componente, no hay estado global.

use crate::config::DirectoryPolicy;
use crate::files::DirectoryLister;
use crate::stats::StatsStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Todo lo que necesita el state machine de un request
#[derive(Clone)]
pub struct ServerContext {
    pub web_root: PathBuf,
    pub directory_policy: DirectoryPolicy,
    pub lister: DirectoryLister,
    pub stats: Arc<dyn StatsStore>,
}

impl ServerContext {
    pub fn new(
        web_root: PathBuf,
        directory_policy: DirectoryPolicy,
        stats: Arc<dyn StatsStore>,
    ) -> Self {
        Self {
            web_root,
            directory_policy,
            lister: DirectoryLister::default(),
            stats,
        }
    }

    /// Reemplaza el comando de listado de directorios
    pub fn with_lister(mut self, lister: DirectoryLister) -> Self {
        self.lister = lister;
        self
    }
}
