//! # Archivos del Web Root
//! src/files/mod.rs
//!
//! Resolución de un target ya validado a una ruta bajo el web root y
//! copia del archivo al socket en bloques de tamaño fijo.

pub mod listing;

pub use listing::DirectoryLister;

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tamaño del bloque de lectura/escritura de archivos
pub const DISK_IO_BUF_SIZE: usize = 4096;

/// Archivo servido cuando el target termina en `/`
pub const INDEX_FILE: &str = "index.html";

/// Ruta en disco para un target
///
/// Se concatena el target al web root tal cual (ya se validó que empieza
/// con `/` y no contiene `..` como segmento). Si termina en `/` se agrega
/// `index.html`.
///
/// # Ejemplo
/// ```
/// use multi_server::files::resolve_target;
/// use std::path::{Path, PathBuf};
///
/// let path = resolve_target(Path::new("/var/www"), "/docs/");
/// assert_eq!(path, PathBuf::from("/var/www/docs/index.html"));
/// ```
pub fn resolve_target(web_root: &Path, target: &str) -> PathBuf {
    let mut path = web_root.as_os_str().to_owned();
    path.push(target);
    if target.ends_with('/') {
        path.push(INDEX_FILE);
    }
    PathBuf::from(path)
}

/// Qué hay en disco para una ruta resuelta
#[derive(Debug)]
pub enum Resource {
    /// La ruta es un directorio
    Directory(PathBuf),
    /// Archivo abierto para lectura; se cierra al soltarlo
    File(File),
    /// No existe, no se pudo abrir o no es un archivo regular
    Missing(io::Error),
}

impl Resource {
    /// Clasifica la ruta: primero directorio, después archivo regular
    ///
    /// Se abre con `O_NONBLOCK` para que un FIFO o un dispositivo nunca
    /// bloqueen el open(); cualquier cosa que no sea archivo regular se
    /// descarta.
    pub fn open(path: PathBuf) -> Self {
        if path.is_dir() {
            return Resource::Directory(path);
        }
        match open_regular(&path) {
            Ok(file) => Resource::File(file),
            Err(e) => Resource::Missing(e),
        }
    }
}

fn open_regular(path: &Path) -> io::Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)?;

    if !file.metadata()?.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }
    Ok(file)
}

/// Falla durante la copia de un archivo al socket
#[derive(Debug, Error)]
pub enum CopyError {
    /// Falló la lectura del archivo
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    /// Falló el envío al cliente (peer desconectado, etc.)
    #[error("send failed: {0}")]
    Write(#[source] io::Error),
}

/// Copia `source` a `sink` en bloques de [`DISK_IO_BUF_SIZE`] bytes
///
/// Se detiene en el primer error, sin reintentar. Retorna los bytes enviados.
pub fn send_file<R: Read, W: Write>(source: &mut R, sink: &mut W) -> Result<u64, CopyError> {
    let mut buf = [0u8; DISK_IO_BUF_SIZE];
    let mut sent = 0u64;

    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        sink.write_all(&buf[..n]).map_err(CopyError::Write)?;
        sent += n as u64;
    }

    sink.flush().map_err(CopyError::Write)?;
    Ok(sent)
}
