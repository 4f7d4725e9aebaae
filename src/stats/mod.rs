//! # Agregador de Estadísticas
//! src/stats/mod.rs
//!
//! Cuatro contadores monótonos, uno por clase de estado (2xx, 3xx, 4xx, 5xx).
//! Cada incremento y cada snapshot se hace bajo exclusión mutua:
//!
//! - `LocalStats`: un mutex en proceso (pool de threads)
//! - `SharedStats`: memoria compartida + semáforo entre procesos (fork)
//!
//! Los consumidores solo ven el trait [`StatsStore`].

pub mod local;
pub mod shared;

pub use local::LocalStats;
pub use shared::SharedStats;

use crate::http::StatusClass;

/// Copia atómica de los cuatro contadores en un instante
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub two_xx: u64,
    pub three_xx: u64,
    pub four_xx: u64,
    pub five_xx: u64,
}

impl StatsSnapshot {
    /// Construye un snapshot desde el arreglo de contadores indexado por clase
    pub fn from_counters(counters: &[u64; 4]) -> Self {
        Self {
            two_xx: counters[StatusClass::Success.index()],
            three_xx: counters[StatusClass::Redirection.index()],
            four_xx: counters[StatusClass::ClientError.index()],
            five_xx: counters[StatusClass::ServerError.index()],
        }
    }

    /// Contador de una clase
    pub fn get(&self, class: StatusClass) -> u64 {
        match class {
            StatusClass::Success => self.two_xx,
            StatusClass::Redirection => self.three_xx,
            StatusClass::ClientError => self.four_xx,
            StatusClass::ServerError => self.five_xx,
        }
    }

    /// Total de respuestas contadas
    pub fn sum(&self) -> u64 {
        self.two_xx + self.three_xx + self.four_xx + self.five_xx
    }
}

/// Contadores compartidos entre contextos de ejecución concurrentes
pub trait StatsStore: Send + Sync {
    /// Incrementa exactamente un contador, bajo el lock del store
    fn increment(&self, class: StatusClass);

    /// Lee los cuatro contadores bajo el lock del store
    fn snapshot(&self) -> StatsSnapshot;
}
