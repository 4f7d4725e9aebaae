//! # Módulo HTTP
//!
//! Protocolo HTTP/1.0 mínimo, implementado a mano:
//!
//! - Lectura acotada de la request line y de los headers
//! - Validación léxica del request (método, versión, target)
//! - Construcción de status lines y páginas HTML de error/estadísticas
//! - Códigos de estado y su clase (2xx..5xx)
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! \r\n
//! <bytes del archivo>
//! ```

pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

pub use request::{Request, RequestError};
pub use response::Response;
pub use status::{StatusClass, StatusCode};
