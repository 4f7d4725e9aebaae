//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta el binario real en puertos libres sobre un web root
//! temporal, le habla por TCP y lo mata al terminar.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Servidor corriendo en un proceso aparte; se mata en Drop
struct ServerProcess {
    child: Child,
    ports: Vec<u16>,
    stderr: Receiver<String>,
}

impl ServerProcess {
    fn start(strategy: &str, port_count: usize, extra: &[&str], root: &Path) -> Self {
        let ports: Vec<u16> = (0..port_count).map(|_| free_port()).collect();

        let mut command = Command::new(env!("CARGO_BIN_EXE_multi_server"));
        command
            .env_remove("RUST_LOG")
            .env("SERVER_LOG", "info")
            .args(["--host", "127.0.0.1", "--strategy", strategy])
            .args(extra)
            .args(ports.iter().map(|p| p.to_string()))
            .arg(root)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = command.spawn().expect("Failed to spawn server");
        let stderr = child.stderr.take().expect("stderr is piped");

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let server = Self {
            child,
            ports,
            stderr: rx,
        };
        server.wait_until_listening();
        server
    }

    /// Espera a que todos los puertos acepten conexiones
    ///
    /// Las sondas cierran sin enviar nada: el servidor no responde ni cuenta.
    fn wait_until_listening(&self) {
        let deadline = Instant::now() + STARTUP_TIMEOUT;
        for port in &self.ports {
            while TcpStream::connect(("127.0.0.1", *port)).is_err() {
                assert!(Instant::now() < deadline, "server never listened on {}", port);
                thread::sleep(Duration::from_millis(20));
            }
        }
    }

    fn port(&self, index: usize) -> u16 {
        self.ports[index]
    }

    fn pid(&self) -> libc::pid_t {
        self.child.id() as libc::pid_t
    }

    /// Busca en stderr una línea que contenga `needle`
    fn wait_for_log(&self, needle: &str) -> String {
        let deadline = Instant::now() + IO_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.stderr.recv_timeout(remaining) {
                Ok(line) if line.contains(needle) => return line,
                Ok(_) => continue,
                Err(_) => panic!("no log line containing {:?}", needle),
            }
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("Failed to find a free port")
}

/// Helper: envía bytes crudos y retorna la response completa
fn send_raw(port: u16, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("Failed to connect");
    stream.set_read_timeout(Some(IO_TIMEOUT)).unwrap();
    stream.set_write_timeout(Some(IO_TIMEOUT)).unwrap();

    stream.write_all(raw).unwrap();
    stream.flush().unwrap();
    stream.shutdown(Shutdown::Write).unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    response
}

fn get(port: u16, target: &str) -> String {
    let request = format!("GET {} HTTP/1.0\r\nHost: localhost\r\n\r\n", target);
    String::from_utf8_lossy(&send_raw(port, request.as_bytes())).into_owned()
}

fn status_line(response: &str) -> &str {
    response.split("\r\n").next().unwrap_or("")
}

/// Helper: extrae el body de una response HTTP
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

fn web_root() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let www = dir.path().join("www");
    std::fs::create_dir_all(www.join("docs")).unwrap();
    std::fs::write(www.join("index.html"), "<h1>home</h1>\n").unwrap();
    std::fs::write(www.join("docs").join("notes.txt"), "some notes\n").unwrap();
    std::fs::write(dir.path().join("secret.txt"), "do not serve\n").unwrap();
    dir
}

fn www(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("www")
}

fn check_basic_scenarios(strategy: &str) {
    let dir = web_root();
    let server = ServerProcess::start(strategy, 1, &[], &www(&dir));
    let port = server.port(0);

    let response = get(port, "/");
    assert_eq!(status_line(&response), "HTTP/1.0 200 OK");
    assert_eq!(extract_body(&response), "<h1>home</h1>\n");

    let response = get(port, "/missing.html");
    assert_eq!(status_line(&response), "HTTP/1.0 404 Not Found");
    assert!(extract_body(&response).contains("<h1>404 Not Found</h1>"));

    let response = String::from_utf8_lossy(&send_raw(port, b"POST / HTTP/1.0\r\n\r\n")).into_owned();
    assert_eq!(status_line(&response), "HTTP/1.0 501 Not Implemented");

    let response = get(port, "/../secret.txt");
    assert_eq!(status_line(&response), "HTTP/1.0 400 Bad Request");
    assert!(!response.contains("do not serve"));

    let response = get(port, "/docs");
    assert_eq!(status_line(&response), "HTTP/1.0 403 Forbidden");

    // 2xx: "/" y la propia consulta; 4xx: 404, 400 y 403; 5xx: 501
    let response = get(port, "/statistics");
    assert_eq!(status_line(&response), "HTTP/1.0 200 OK");
    let body = extract_body(&response);
    assert!(body.contains("Number of 2XX : 2\n"), "{}", body);
    assert!(body.contains("<br>Number of 3XX : 0\n"), "{}", body);
    assert!(body.contains("<br>Number of 4XX : 3\n"), "{}", body);
    assert!(body.contains("<br>Number of 5XX : 1\n"), "{}", body);
    assert!(body.contains("<br>Sum : 6\n"), "{}", body);
}

#[test]
fn test_pool_basic_scenarios() {
    check_basic_scenarios("pool");
}

#[test]
fn test_fork_basic_scenarios() {
    check_basic_scenarios("fork");
}

#[test]
fn test_response_has_no_headers() {
    let dir = web_root();
    let server = ServerProcess::start("pool", 1, &[], &www(&dir));

    let response = get(server.port(0), "/docs/notes.txt");
    assert_eq!(response, "HTTP/1.0 200 OK\r\n\r\nsome notes\n");
}

#[test]
fn test_directory_listing_policy() {
    let dir = web_root();
    let server = ServerProcess::start("pool", 1, &["--directory-policy", "list"], &www(&dir));

    let response = get(server.port(0), "/docs");
    assert_eq!(status_line(&response), "HTTP/1.0 200 OK");
    assert!(extract_body(&response).contains("notes.txt"));
}

#[test]
fn test_every_port_serves_same_root() {
    let dir = web_root();
    let server = ServerProcess::start("pool", 3, &[], &www(&dir));

    for index in 0..3 {
        let response = get(server.port(index), "/");
        assert_eq!(status_line(&response), "HTTP/1.0 200 OK", "port {}", server.port(index));
    }

    // Las estadísticas son globales, no por puerto
    let body = get(server.port(1), "/statistics");
    assert!(body.contains("Number of 2XX : 4\n"), "{}", body);
}

fn check_concurrent_not_found(strategy: &str, extra: &[&str]) {
    let ports = 2;
    let clients_per_port = 10;
    let dir = web_root();
    let server = ServerProcess::start(strategy, ports, extra, &www(&dir));

    let handles: Vec<_> = (0..ports)
        .flat_map(|index| {
            let port = server.port(index);
            (0..clients_per_port).map(move |i| {
                thread::spawn(move || get(port, &format!("/nope-{}.html", i)))
            })
        })
        .collect();

    for handle in handles {
        let response = handle.join().unwrap();
        assert_eq!(status_line(&response), "HTTP/1.0 404 Not Found");
    }

    let body = get(server.port(0), "/statistics");
    let expected = format!("<br>Number of 4XX : {}\n", ports * clients_per_port);
    assert!(body.contains(&expected), "{}", body);
    assert!(body.contains("Number of 2XX : 1\n"), "{}", body);
}

#[test]
fn test_fork_counts_across_processes() {
    check_concurrent_not_found("fork", &[]);
}

#[test]
fn test_pool_counts_with_queueing() {
    // Menos workers que clientes: el resto espera en la cola
    check_concurrent_not_found("pool", &["--workers", "2"]);
}

#[test]
fn test_peer_closing_early_gets_no_response() {
    let dir = web_root();
    let server = ServerProcess::start("pool", 1, &[], &www(&dir));
    let port = server.port(0);

    let response = send_raw(port, b"GET / HTTP/1.0\r\nHost: x\r\n");
    assert!(response.is_empty());

    let body = get(port, "/statistics");
    assert!(body.contains("<br>Sum : 1\n"), "{}", body);
}

fn check_dump_signal(strategy: &str) {
    let dir = web_root();
    let server = ServerProcess::start(strategy, 1, &[], &www(&dir));
    let port = server.port(0);

    assert_eq!(status_line(&get(port, "/")), "HTTP/1.0 200 OK");
    assert_eq!(status_line(&get(port, "/gone")), "HTTP/1.0 404 Not Found");

    // SAFETY: señal a un proceso hijo propio.
    let rc = unsafe { libc::kill(server.pid(), libc::SIGUSR1) };
    assert_eq!(rc, 0);

    let line = server.wait_for_log("Request statistics");
    assert!(line.contains("count_2xx=1"), "{}", line);
    assert!(line.contains("count_4xx=1"), "{}", line);
    assert!(line.contains("sum=2"), "{}", line);

    // El servidor sigue atendiendo después del volcado
    assert_eq!(status_line(&get(port, "/")), "HTTP/1.0 200 OK");
}

#[test]
fn test_pool_dump_signal() {
    check_dump_signal("pool");
}

#[test]
fn test_fork_dump_signal() {
    check_dump_signal("fork");
}

#[test]
fn test_bad_arguments_exit_with_error() {
    let dir = web_root();
    let status = Command::new(env!("CARGO_BIN_EXE_multi_server"))
        .args(["--strategy", "pool", "--workers", "0", "8080"])
        .arg(www(&dir))
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));

    let status = Command::new(env!("CARGO_BIN_EXE_multi_server"))
        .args(["8080"])
        .arg(dir.path().join("not-there"))
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_port_in_use_exits_with_error() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    let dir = web_root();

    let output = Command::new(env!("CARGO_BIN_EXE_multi_server"))
        .args(["--host", "127.0.0.1", &port.to_string()])
        .arg(www(&dir))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains(&port.to_string()));
}
