//! # Señal de Volcado de Estadísticas
//! src/server/signal.rs
//!
//! SIGUSR1 pide al servidor que escriba un snapshot de las estadísticas en
//! el log. El handler solo levanta un flag atómico y escribe un byte en un
//! self-pipe; el acceptor tiene el extremo de lectura en su set de poll(),
//! así una señal que llega justo antes de la espera igual lo despierta.
//!
//! En la variante de pool los workers nacen con SIGUSR1 bloqueada, así la
//! señal siempre interrumpe al acceptor (poll() retorna EINTR) y nunca a un
//! worker.

use crate::error::{ServerError, ServerResult};
use std::io::{self, Read, Write};
use std::mem::MaybeUninit;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Señal del operador para volcar estadísticas
pub const DUMP_SIGNAL: libc::c_int = signal_hook::consts::SIGUSR1;

/// Flag levantado por el handler de la señal
#[derive(Debug, Clone, Default)]
pub struct DumpSignal {
    requested: Arc<AtomicBool>,
    wake: Option<Arc<WakePipe>>,
}

/// Par de sockets no bloqueantes: la señal escribe, el acceptor lee
#[derive(Debug)]
struct WakePipe {
    read: UnixStream,
    write: UnixStream,
}

impl DumpSignal {
    /// Flag sin handler ni self-pipe
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag con self-pipe, sin handler instalado
    pub fn with_wake_pipe() -> io::Result<Self> {
        let (read, write) = UnixStream::pair()?;
        read.set_nonblocking(true)?;
        write.set_nonblocking(true)?;

        Ok(Self {
            requested: Arc::default(),
            wake: Some(Arc::new(WakePipe { read, write })),
        })
    }

    /// Instala el handler de SIGUSR1
    ///
    /// El flag se registra antes que el pipe: cuando el acceptor despierta
    /// por el pipe, el flag ya está levantado.
    pub fn register() -> ServerResult<Self> {
        let signal = Self::with_wake_pipe().map_err(ServerError::Signal)?;
        signal_hook::flag::register(DUMP_SIGNAL, Arc::clone(&signal.requested))
            .map_err(ServerError::Signal)?;

        if let Some(wake) = &signal.wake {
            let write = wake.write.try_clone().map_err(ServerError::Signal)?;
            signal_hook::low_level::pipe::register(DUMP_SIGNAL, write)
                .map_err(ServerError::Signal)?;
        }
        Ok(signal)
    }

    /// Marca un volcado pendiente sin pasar por la señal
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        if let Some(wake) = &self.wake {
            // Pipe lleno: ya hay un despertar pendiente
            let _ = (&wake.write).write(&[1]);
        }
    }

    /// Descriptor que se vuelve legible con cada pedido de volcado
    pub fn wake_fd(&self) -> Option<RawFd> {
        self.wake.as_ref().map(|wake| wake.read.as_raw_fd())
    }

    /// Vacía el self-pipe
    pub fn drain_wake(&self) {
        let Some(wake) = &self.wake else { return };
        let mut buf = [0u8; 64];
        loop {
            match (&wake.read).read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    }

    /// Consume el pedido pendiente, si lo hay
    ///
    /// Varias señales antes de la siguiente revisión producen un solo volcado.
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }
}

/// Ejecuta `f` con SIGUSR1 bloqueada en el thread actual
///
/// Los threads creados dentro de `f` heredan la máscara. Al salir se
/// restaura la máscara previa.
pub fn with_dump_signal_blocked<T>(f: impl FnOnce() -> T) -> ServerResult<T> {
    let previous = mask_dump_signal(libc::SIG_BLOCK).map_err(ServerError::Signal)?;
    let result = f();
    set_thread_mask(&previous).map_err(ServerError::Signal)?;
    Ok(result)
}

fn mask_dump_signal(how: libc::c_int) -> io::Result<libc::sigset_t> {
    let mut set = MaybeUninit::<libc::sigset_t>::uninit();
    let mut previous = MaybeUninit::<libc::sigset_t>::uninit();

    // SAFETY: sigemptyset inicializa `set` antes de cualquier lectura;
    // pthread_sigmask escribe la máscara anterior en `previous` si retorna 0.
    unsafe {
        if libc::sigemptyset(set.as_mut_ptr()) != 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::sigaddset(set.as_mut_ptr(), DUMP_SIGNAL) != 0 {
            return Err(io::Error::last_os_error());
        }
        let rc = libc::pthread_sigmask(how, set.as_ptr(), previous.as_mut_ptr());
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc));
        }
        Ok(previous.assume_init())
    }
}

fn set_thread_mask(mask: &libc::sigset_t) -> io::Result<()> {
    // SAFETY: `mask` es un sigset_t válido obtenido de pthread_sigmask.
    let rc = unsafe { libc::pthread_sigmask(libc::SIG_SETMASK, mask, std::ptr::null_mut()) };
    if rc != 0 {
        return Err(io::Error::from_raw_os_error(rc));
    }
    Ok(())
}

/// Verifica si SIGUSR1 está bloqueada en el thread actual
pub fn dump_signal_blocked() -> io::Result<bool> {
    let mut current = MaybeUninit::<libc::sigset_t>::uninit();

    // SAFETY: con `set` nulo pthread_sigmask solo lee la máscara actual.
    unsafe {
        let rc = libc::pthread_sigmask(libc::SIG_BLOCK, std::ptr::null(), current.as_mut_ptr());
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc));
        }
        Ok(libc::sigismember(current.as_ptr(), DUMP_SIGNAL) == 1)
    }
}
