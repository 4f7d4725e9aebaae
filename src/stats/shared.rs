//! # Contadores Compartidos entre Procesos
//! src/stats/shared.rs
//!
//! Store de estadísticas para la estrategia fork. Los contadores viven en
//! una región anónima `MAP_SHARED`: el padre la crea antes del primer fork
//! y cada hijo hereda el mismo mapeo. La exclusión mutua la da un semáforo
//! POSIX con `pshared = 1` inicializado en 1, guardado en la misma región.
//!
//! ```text
//! +-----------+---------------------------------+
//! | sem_t     | [2xx, 3xx, 4xx, 5xx] (u64 x 4)  |
//! +-----------+---------------------------------+
//! ```

use super::{StatsSnapshot, StatsStore};
use crate::error::{ServerError, ServerResult};
use crate::http::StatusClass;
use std::io;
use std::mem;
use std::ptr::{self, NonNull};
use tracing::{debug, error};

#[repr(C)]
struct SharedRegion {
    sem: libc::sem_t,
    counters: [u64; 4],
}

/// Contadores en memoria compartida protegidos por un semáforo de procesos
pub struct SharedStats {
    region: NonNull<SharedRegion>,
    /// Proceso que inicializó el semáforo; solo él lo destruye
    owner: libc::pid_t,
}

// La región solo se toca con el semáforo tomado.
unsafe impl Send for SharedStats {}
unsafe impl Sync for SharedStats {}

impl SharedStats {
    /// Mapea la región compartida e inicializa el semáforo
    ///
    /// Errores de `mmap` o `sem_init` son fatales para el servidor.
    pub fn new() -> ServerResult<Self> {
        let len = mem::size_of::<SharedRegion>();

        // SAFETY: mapeo anónimo nuevo, sin archivo ni dirección fija.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(ServerError::SharedMemory(io::Error::last_os_error()));
        }
        let region = NonNull::new(addr.cast::<SharedRegion>()).ok_or_else(|| {
            ServerError::SharedMemory(io::Error::new(io::ErrorKind::Other, "mmap returned null"))
        })?;

        // SAFETY: la región es nuestra, tiene el tamaño de SharedRegion y
        // nadie más la ve todavía.
        let rc = unsafe {
            ptr::addr_of_mut!((*region.as_ptr()).counters).write([0; 4]);
            libc::sem_init(ptr::addr_of_mut!((*region.as_ptr()).sem), 1, 1)
        };
        if rc != 0 {
            let err = io::Error::last_os_error();
            // SAFETY: mismo puntero y largo que devolvió mmap.
            unsafe { libc::munmap(addr, len) };
            return Err(ServerError::Semaphore(err));
        }

        debug!(bytes = len, "Región de estadísticas compartida mapeada");

        Ok(Self {
            region,
            // SAFETY: getpid no puede fallar.
            owner: unsafe { libc::getpid() },
        })
    }

    fn sem(&self) -> *mut libc::sem_t {
        // SAFETY: la región vive mientras viva self.
        unsafe { ptr::addr_of_mut!((*self.region.as_ptr()).sem) }
    }

    /// Toma el semáforo; reintenta si una señal interrumpe la espera
    fn lock(&self) -> SemaphoreGuard<'_> {
        loop {
            // SAFETY: semáforo inicializado en new().
            if unsafe { libc::sem_wait(self.sem()) } == 0 {
                return SemaphoreGuard { stats: self };
            }

            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                debug!("sem_wait interrumpido por una señal, reintentando");
                continue;
            }

            // Sin el semáforo no hay forma de contar sin perder updates.
            error!(error = %err, "sem_wait falló sobre el semáforo de estadísticas");
            std::process::exit(1);
        }
    }
}

/// Semáforo tomado; `sem_post` al salir de scope
struct SemaphoreGuard<'a> {
    stats: &'a SharedStats,
}

impl SemaphoreGuard<'_> {
    fn counters(&mut self) -> &mut [u64; 4] {
        // SAFETY: el guard garantiza acceso exclusivo entre procesos.
        unsafe { &mut *ptr::addr_of_mut!((*self.stats.region.as_ptr()).counters) }
    }
}

impl Drop for SemaphoreGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: este guard tomó el semáforo en lock().
        unsafe { libc::sem_post(self.stats.sem()) };
    }
}

impl StatsStore for SharedStats {
    fn increment(&self, class: StatusClass) {
        let mut guard = self.lock();
        guard.counters()[class.index()] += 1;
    }

    fn snapshot(&self) -> StatsSnapshot {
        let mut guard = self.lock();
        StatsSnapshot::from_counters(guard.counters())
    }
}

impl Drop for SharedStats {
    fn drop(&mut self) {
        // SAFETY: puntero y largo del mmap original; el semáforo solo se
        // destruye en el proceso que lo creó.
        unsafe {
            if libc::getpid() == self.owner {
                libc::sem_destroy(self.sem());
            }
            libc::munmap(
                self.region.as_ptr().cast::<libc::c_void>(),
                mem::size_of::<SharedRegion>(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_region_starts_at_zero() {
        let stats = SharedStats::new().unwrap();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_increment_and_snapshot() {
        let stats = SharedStats::new().unwrap();

        stats.increment(StatusClass::Success);
        stats.increment(StatusClass::ClientError);
        stats.increment(StatusClass::ClientError);
        stats.increment(StatusClass::Redirection);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.two_xx, 1);
        assert_eq!(snapshot.three_xx, 1);
        assert_eq!(snapshot.four_xx, 2);
        assert_eq!(snapshot.five_xx, 0);
        assert_eq!(snapshot.sum(), 4);
    }

    #[test]
    fn test_threads_do_not_lose_updates() {
        let stats = Arc::new(SharedStats::new().unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..500 {
                        stats.increment(StatusClass::ServerError);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.snapshot().five_xx, 2000);
    }

    #[test]
    fn test_child_process_updates_are_visible_to_parent() {
        let stats = SharedStats::new().unwrap();

        // SAFETY: el hijo solo usa el semáforo y termina con _exit.
        let pid = unsafe { libc::fork() };
        assert!(pid >= 0, "fork failed");

        if pid == 0 {
            for _ in 0..1000 {
                stats.increment(StatusClass::ClientError);
            }
            unsafe { libc::_exit(0) };
        }

        for _ in 0..1000 {
            stats.increment(StatusClass::ClientError);
        }

        let mut status = 0;
        let reaped = unsafe { libc::waitpid(pid, &mut status, 0) };
        assert_eq!(reaped, pid);
        assert!(libc::WIFEXITED(status));

        assert_eq!(stats.snapshot().four_xx, 2000);
    }
}
