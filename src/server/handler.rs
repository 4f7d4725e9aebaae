//! # State Machine de un Request
//! src/server/handler.rs
//!
//! Atiende una conexión de principio a fin, sin volver atrás:
//!
//! ```text
//! ReadRequestLine → ParseAndValidate → SkipHeaders → Route → Finalize
//! ```
//!
//! El primer error termina la conexión con su código de estado. Cada status
//! line enviada incrementa el contador de su clase antes de escribirse.
//! La conexión, el archivo abierto y la ruta resuelta son valores con dueño:
//! se liberan en cualquier camino de salida.

use super::context::ServerContext;
use crate::config::DirectoryPolicy;
use crate::dispatch::Connection;
use crate::files::{resolve_target, send_file, Resource};
use crate::http::request::{read_request_line, skip_headers};
use crate::http::{Request, RequestError, Response, StatusClass, StatusCode};
use std::io::{self, BufRead, BufReader, Write};
use std::net::SocketAddr;
use std::path::Path;
use tracing::{debug, info, warn};

/// Ruta reservada que nunca toca el sistema de archivos
pub const STATISTICS_PATH: &str = "/statistics";

/// Resultado de atender un request
#[derive(Debug)]
pub struct Outcome {
    /// Request line tokenizada, si se llegó a leer
    pub request: Option<Request>,
    pub status: StatusCode,
}

/// Atiende una conexión aceptada y la cierra
///
/// Retorna el código de estado registrado en el log de acceso.
pub fn handle_connection(conn: Connection, ctx: &ServerContext) -> StatusCode {
    let Connection { stream, peer } = conn;
    let mut reader = BufReader::new(&stream);
    let mut writer = &stream;

    let outcome = serve(&mut reader, &mut writer, ctx);
    log_access(peer, &outcome);

    outcome.status
}

/// Corre el state machine sobre un lector/escritor cualquiera
pub fn serve<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, ctx: &ServerContext) -> Outcome {
    let request = match read_request_line(reader) {
        Ok(request) => request,
        Err(err) => return reject(writer, ctx, None, err),
    };

    if let Err(err) = request.validate() {
        return reject(writer, ctx, Some(request), err);
    }

    if let Err(err) = skip_headers(reader) {
        return reject(writer, ctx, Some(request), err);
    }

    let status = route(&request, writer, ctx);
    Outcome {
        request: Some(request),
        status,
    }
}

/// Termina el request con el estado del error (si el peer sigue ahí)
fn reject<W: Write>(
    writer: &mut W,
    ctx: &ServerContext,
    request: Option<Request>,
    err: RequestError,
) -> Outcome {
    let status = err.status();
    debug!(error = %err, status = status.as_u16(), "Request rechazado");

    if !err.peer_closed() {
        let _ = send(writer, ctx, &Response::error(status));
    }

    Outcome { request, status }
}

/// Cuenta la clase del estado y escribe la respuesta
///
/// Un error de escritura se registra y se devuelve; nunca se reintenta.
fn send<W: Write>(writer: &mut W, ctx: &ServerContext, response: &Response) -> io::Result<()> {
    ctx.stats.increment(response.status().class());
    response.write_to(writer).map_err(|e| {
        warn!(error = %e, status = response.status().as_u16(), "send() failed");
        e
    })
}

fn route<W: Write>(request: &Request, writer: &mut W, ctx: &ServerContext) -> StatusCode {
    if request.target() == STATISTICS_PATH {
        return serve_statistics(writer, ctx);
    }

    let path = resolve_target(&ctx.web_root, request.target());
    match Resource::open(path) {
        Resource::Directory(dir) => serve_directory(&dir, writer, ctx),
        Resource::File(mut file) => {
            if send(writer, ctx, &Response::new(StatusCode::Ok)).is_ok() {
                match send_file(&mut file, writer) {
                    Ok(bytes) => debug!(bytes, target = request.target(), "Archivo enviado"),
                    Err(e) => warn!(error = %e, target = request.target(), "Transferencia abandonada"),
                }
            }
            StatusCode::Ok
        }
        Resource::Missing(e) => {
            debug!(error = %e, target = request.target(), "No se pudo abrir el archivo");
            let _ = send(writer, ctx, &Response::error(StatusCode::NotFound));
            StatusCode::NotFound
        }
    }
}

/// La consulta a estadísticas cuenta como 2xx antes de tomar el snapshot
fn serve_statistics<W: Write>(writer: &mut W, ctx: &ServerContext) -> StatusCode {
    ctx.stats.increment(StatusClass::Success);
    let snapshot = ctx.stats.snapshot();

    if let Err(e) = Response::statistics(&snapshot).write_to(writer) {
        warn!(error = %e, "send() failed");
    }
    StatusCode::Ok
}

fn serve_directory<W: Write>(dir: &Path, writer: &mut W, ctx: &ServerContext) -> StatusCode {
    match ctx.directory_policy {
        DirectoryPolicy::Forbid => {
            let _ = send(writer, ctx, &Response::error(StatusCode::Forbidden));
            StatusCode::Forbidden
        }
        DirectoryPolicy::List => match ctx.lister.list(dir) {
            Ok(listing) => {
                let _ = send(writer, ctx, &Response::new(StatusCode::Ok).with_body_bytes(listing));
                StatusCode::Ok
            }
            Err(e) => {
                warn!(error = %e, dir = %dir.display(), "No se pudo ejecutar el listado");
                let _ = send(writer, ctx, &Response::error(StatusCode::InternalServerError));
                StatusCode::InternalServerError
            }
        },
    }
}

/// Línea de log: `peer (pid) "METHOD TARGET VERSION" STATUS REASON`
fn log_access(peer: SocketAddr, outcome: &Outcome) {
    let (method, target, version) = match &outcome.request {
        Some(request) => (request.method(), request.target(), request.version()),
        None => ("", "", ""),
    };
    info!(
        "{} ({}) \"{} {} {}\" {}",
        peer.ip(),
        std::process::id(),
        method,
        target,
        version,
        outcome.status
    );
}
