//! # Listado de Directorios
//! src/files/listing.rs
//!
//! Colaborador externo para la política `list`: ejecuta `ls -al <dir>` como
//! subproceso y devuelve su salida (stdout seguido de stderr).

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Comando que genera el listado
#[derive(Debug, Clone)]
pub struct DirectoryLister {
    program: OsString,
    args: Vec<OsString>,
}

impl DirectoryLister {
    /// Lister con un programa y argumentos arbitrarios; la ruta va al final
    pub fn new(program: impl Into<OsString>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(OsString::from).collect(),
        }
    }

    /// Ejecuta el listado de forma síncrona
    ///
    /// Solo falla si el programa no se pudo lanzar; un código de salida
    /// distinto de cero sigue produciendo su texto (normalmente en stderr).
    pub fn list(&self, dir: &Path) -> io::Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(dir)
            .stdin(Stdio::null())
            .output()?;

        let mut text = output.stdout;
        text.extend_from_slice(&output.stderr);
        Ok(text)
    }
}

impl Default for DirectoryLister {
    /// `ls -al`
    fn default() -> Self {
        Self::new("ls", &["-al"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lists_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), b"hi").unwrap();

        let text = DirectoryLister::default().list(dir.path()).unwrap();
        let text = String::from_utf8_lossy(&text);

        assert!(text.contains("hello.txt"), "{}", text);
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let lister = DirectoryLister::new("definitely-not-a-real-lister", &[]);
        let dir = tempfile::tempdir().unwrap();
        assert!(lister.list(dir.path()).is_err());
    }
}
