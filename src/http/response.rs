//! # Construcción de Respuestas HTTP
//!
//! Este servidor no manda headers: una respuesta es la status line,
//! una línea vacía y (opcionalmente) un body.
//!
//! ```text
//! HTTP/1.0 404 Not Found\r\n
//! \r\n
//! <html><body>
//! <h1>404 Not Found</h1>
//! </body></html>
//! ```
//!
//! Para una transferencia de archivo exitosa el body va vacío y los bytes
//! del archivo se escriben después, en bloques.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use multi_server::http::{Response, StatusCode};
//!
//! let response = Response::error(StatusCode::NotFound);
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 404 Not Found\r\n\r\n"));
//! ```

use super::{StatusClass, StatusCode};
use crate::stats::StatsSnapshot;
use std::io::{self, Write};

/// Versión que usamos en todas las status lines
pub const HTTP_VERSION: &str = "HTTP/1.0";

/// Representa una respuesta HTTP/1.0 (status line + body opcional)
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Respuesta sin body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    /// Establece el cuerpo de la respuesta desde un string
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    /// Establece el cuerpo de la respuesta desde bytes
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Respuesta de error con una página HTML que nombra el estado
    pub fn error(status: StatusCode) -> Self {
        let body = format!(
            "<html><body>\n<h1>{} {}</h1>\n</body></html>\n",
            status.as_u16(),
            status.reason_phrase()
        );
        Self::new(status).with_body(&body)
    }

    /// Página de estadísticas (200 OK)
    pub fn statistics(snapshot: &StatsSnapshot) -> Self {
        let mut body = String::from("<html><body>\n<h1>Request Statistics</h1>\n");
        for (i, class) in StatusClass::ALL.iter().enumerate() {
            if i > 0 {
                body.push_str("<br>");
            }
            body.push_str(&format!("Number of {} : {}\n", class.label(), snapshot.get(*class)));
        }
        body.push_str(&format!("<br>Sum : {}\n</body></html>\n", snapshot.sum()));
        Self::new(StatusCode::Ok).with_body(&body)
    }

    /// Status line + línea vacía + body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = format!("{} {}\r\n\r\n", HTTP_VERSION, self.status).into_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    /// Escribe la respuesta completa en el socket
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
