//! # Códigos de Estado HTTP
//!
//! Este módulo define los códigos de estado HTTP/1.0 que emite el servidor
//! y su clase (2xx, 3xx, 4xx, 5xx), que es lo que cuentan las estadísticas.
//!
//! - **2xx**: Éxito (200 OK)
//! - **3xx**: Redirección (ningún camino del servidor las produce)
//! - **4xx**: Error del cliente (400, 403, 404)
//! - **5xx**: Error del servidor (500, 501)

/// Clase de un código de estado; cada una tiene su contador
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Success,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// Todas las clases, en el orden en que se reportan
    pub const ALL: [StatusClass; 4] = [
        StatusClass::Success,
        StatusClass::Redirection,
        StatusClass::ClientError,
        StatusClass::ServerError,
    ];

    /// Posición del contador de esta clase
    pub fn index(&self) -> usize {
        match self {
            StatusClass::Success => 0,
            StatusClass::Redirection => 1,
            StatusClass::ClientError => 2,
            StatusClass::ServerError => 3,
        }
    }

    /// Etiqueta usada en la página de estadísticas ("2XX", "3XX", ...)
    pub fn label(&self) -> &'static str {
        match self {
            StatusClass::Success => "2XX",
            StatusClass::Redirection => "3XX",
            StatusClass::ClientError => "4XX",
            StatusClass::ServerError => "5XX",
        }
    }
}

/// Representa los códigos de estado HTTP que emite nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - Archivo, listado o estadísticas enviados
    Ok = 200,

    /// 400 Bad Request - Target sin `/` inicial, traversal o request truncado
    BadRequest = 400,

    /// 403 Forbidden - Directorio con política `forbid`
    Forbidden = 403,

    /// 404 Not Found - El archivo no existe o no se puede abrir
    NotFound = 404,

    /// 500 Internal Server Error - No se pudo lanzar el listador de directorios
    InternalServerError = 500,

    /// 501 Not Implemented - Método o versión no soportados, request line mal formada
    NotImplemented = 501,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use multi_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use multi_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        reason_phrase(self.as_u16())
    }

    /// Clase del código, usada por el agregador de estadísticas
    pub fn class(&self) -> StatusClass {
        match self {
            StatusCode::Ok => StatusClass::Success,
            StatusCode::BadRequest | StatusCode::Forbidden | StatusCode::NotFound => {
                StatusClass::ClientError
            }
            StatusCode::InternalServerError | StatusCode::NotImplemented => {
                StatusClass::ServerError
            }
        }
    }
}

/// Reason phrase de cualquier código HTTP/1.0 conocido
///
/// Cubre también códigos que el servidor no produce hoy (201, 3xx, 502...)
/// para que los logs y extensiones futuras tengan un texto correcto.
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Moved Temporarily",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown Status Code",
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
