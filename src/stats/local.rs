//! # Contadores en Proceso
//! src/stats/local.rs
//!
//! Store de estadísticas para el pool de threads: un arreglo de contadores
//! detrás de un mutex compartido por todos los workers.

use super::{StatsSnapshot, StatsStore};
use crate::http::StatusClass;
use parking_lot::Mutex;
use std::sync::Arc;

/// Contadores thread-safe
#[derive(Clone, Default)]
pub struct LocalStats {
    inner: Arc<Mutex<[u64; 4]>>,
}

impl LocalStats {
    /// Crea un store con todos los contadores en cero
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsStore for LocalStats {
    fn increment(&self, class: StatusClass) {
        let mut counters = self.inner.lock();
        counters[class.index()] += 1;
    }

    fn snapshot(&self) -> StatsSnapshot {
        let counters = self.inner.lock();
        StatsSnapshot::from_counters(&counters)
    }
}
