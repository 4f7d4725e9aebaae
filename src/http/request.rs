//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Lectura y validación de la request line y de los headers.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! GET /index.html HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! User-Agent: curl/7.68.0\r\n
//! \r\n
//! ```
//!
//! La validación es puramente léxica: nada de este módulo toca el
//! sistema de archivos. Los headers se leen y se descartan.

use super::StatusCode;
use std::io::{self, BufRead, Read};
use thiserror::Error;

/// Largo máximo de una línea leída del socket (request line o header)
pub const MAX_LINE_LEN: usize = 8192;

/// Únicas versiones que aceptamos en la request line
pub const ACCEPTED_VERSIONS: [&str; 2] = ["HTTP/1.0", "HTTP/1.1"];

/// Único método soportado
pub const SUPPORTED_METHOD: &str = "GET";

/// Errores de protocolo de una conexión
///
/// Cada uno se traduce a un código de estado; ninguno es fatal para el servidor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// El peer cerró antes de mandar la request line
    #[error("connection closed before the request line")]
    EmptyRequest,

    /// La request line no tiene exactamente 3 tokens
    #[error("request line must have exactly 3 tokens, got {0}")]
    InvalidRequestLine(usize),

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("unsupported HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("request target must begin with '/': {0}")]
    MissingLeadingSlash(String),

    /// El target contiene `/../` o termina en `/..`
    #[error("path traversal in request target: {0}")]
    PathTraversal(String),

    /// El peer cerró antes de la línea vacía que termina los headers
    #[error("connection closed before the end of headers")]
    IncompleteHeaders,
}

impl RequestError {
    /// Código de estado que corresponde a este error
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::InvalidRequestLine(_)
            | RequestError::UnsupportedMethod(_)
            | RequestError::InvalidHttpVersion(_) => StatusCode::NotImplemented,
            RequestError::EmptyRequest
            | RequestError::MissingLeadingSlash(_)
            | RequestError::PathTraversal(_)
            | RequestError::IncompleteHeaders => StatusCode::BadRequest,
        }
    }

    /// `true` si el peer ya cerró su lado: no se le escribe nada
    pub fn peer_closed(&self) -> bool {
        matches!(self, RequestError::EmptyRequest | RequestError::IncompleteHeaders)
    }
}

/// Request line tokenizada: `METHOD TARGET VERSION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    target: String,
    version: String,
}

impl Request {
    /// Separa la request line en tokens
    ///
    /// Los separadores son espacio, tab, CR y LF; tokens vacíos se ignoran.
    /// Solo verifica que haya exactamente tres tokens, el resto lo hace
    /// [`Request::validate`].
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use multi_server::http::Request;
    ///
    /// let request = Request::parse("GET /index.html HTTP/1.0\r\n").unwrap();
    /// assert_eq!(request.target(), "/index.html");
    /// assert!(request.validate().is_ok());
    /// ```
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let tokens: Vec<&str> = line
            .split(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
            .filter(|token| !token.is_empty())
            .collect();

        match tokens.as_slice() {
            [method, target, version] => Ok(Request {
                method: method.to_string(),
                target: target.to_string(),
                version: version.to_string(),
            }),
            other => Err(RequestError::InvalidRequestLine(other.len())),
        }
    }

    /// Valida método, versión y target, en ese orden
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.method != SUPPORTED_METHOD {
            return Err(RequestError::UnsupportedMethod(self.method.clone()));
        }

        if !ACCEPTED_VERSIONS.contains(&self.version.as_str()) {
            return Err(RequestError::InvalidHttpVersion(self.version.clone()));
        }

        if !self.target.starts_with('/') {
            return Err(RequestError::MissingLeadingSlash(self.target.clone()));
        }

        if self.target.contains("/../") || self.target.ends_with("/..") {
            return Err(RequestError::PathTraversal(self.target.clone()));
        }

        Ok(())
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Lee una línea (hasta `\n` inclusive) acotada a [`MAX_LINE_LEN`] bytes
///
/// Retorna la cantidad de bytes leídos; 0 significa fin de stream.
pub fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    buf.clear();
    reader.by_ref().take(MAX_LINE_LEN as u64).read_until(b'\n', buf)
}

/// Lee la request line y la tokeniza
///
/// Un error de lectura se trata igual que un cierre del peer.
pub fn read_request_line<R: BufRead>(reader: &mut R) -> Result<Request, RequestError> {
    let mut buf = Vec::with_capacity(256);
    match read_line(reader, &mut buf) {
        Ok(0) | Err(_) => Err(RequestError::EmptyRequest),
        Ok(_) => Request::parse(&String::from_utf8_lossy(&buf)),
    }
}

/// Descarta headers hasta la línea vacía (`\r\n` o `\n`)
///
/// Un header más largo que [`MAX_LINE_LEN`] llega en varios pedazos; solo
/// un pedazo que empieza una línea nueva puede ser la línea vacía.
pub fn skip_headers<R: BufRead>(reader: &mut R) -> Result<(), RequestError> {
    let mut buf = Vec::with_capacity(256);
    let mut at_line_start = true;
    loop {
        match read_line(reader, &mut buf) {
            Ok(0) | Err(_) => return Err(RequestError::IncompleteHeaders),
            Ok(_) if at_line_start && (buf == b"\r\n" || buf == b"\n") => return Ok(()),
            Ok(_) => at_line_start = buf.ends_with(b"\n"),
        }
    }
}
