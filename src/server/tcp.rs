//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Implementación del servidor TCP que maneja múltiples conexiones simultáneas
//! usando threads. Cada conexión se procesa en su propio thread:
//!
//! 1. El loop principal espera un lugar libre en [`Admission`] y acepta
//! 2. El worker lee del socket en pedazos de `recv_buf_size` bytes
//! 3. Cada pedazo alimenta al [`RequestParser`] hasta completar el request
//! 4. El [`Resolver`] arma la respuesta, se envía y se cierra el socket
//!
//! Un request mal formado se responde con 400 (o 413 si la cabecera o el
//! body declarado son muy grandes) y uno que no termina de llegar a tiempo
//! con 408. Después de una respuesta de error se cierra solo la escritura y
//! se descarta lo que el cliente siga enviando, para que el cierre no se
//! convierta en un RST que le haga perder la respuesta.

use super::admission::{Admission, Permit};
use crate::config::Config;
use crate::error::ServerError;
use crate::http::parser::{Parse, ParseError, RequestParser};
use crate::http::{Request, Response, StatusCode};
use crate::resolver::Resolver;
use std::fs;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Versión usada cuando no se llegó a leer la del request
const FALLBACK_VERSION: &str = "HTTP/1.1";

/// Tiempo máximo descartando bytes del cliente después de un error
const LINGER_TIMEOUT: Duration = Duration::from_secs(2);

/// Bytes máximos descartados antes de cerrar igual
const LINGER_MAX_BYTES: usize = 256 * 1024;

/// Parámetros de lectura que recibe cada worker
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub recv_buf_size: usize,
    pub read_timeout: Duration,
    pub request_timeout: Duration,
    pub write_timeout: Duration,
    pub max_head_bytes: usize,
    pub max_body_bytes: usize,
}

impl ConnectionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recv_buf_size: config.recv_buf_size,
            read_timeout: config.read_timeout(),
            request_timeout: config.request_timeout(),
            write_timeout: config.write_timeout(),
            max_head_bytes: config.max_head_bytes,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Por qué no se obtuvo un request del socket
#[derive(Debug)]
enum ReadError {
    Malformed(ParseError),
    TimedOut,
    Io(io::Error),
}

/// Servidor HTTP/1.1 concurrente
pub struct Server {
    resolver: Arc<Resolver>,
    admission: Arc<Admission>,
    settings: ConnectionSettings,
    listener: TcpListener,
}

impl Server {
    /// Prepara el directorio raíz y abre el socket de escucha
    pub fn new(config: Config) -> Result<Self, ServerError> {
        if !config.root.exists() {
            fs::create_dir_all(&config.root).map_err(|source| ServerError::Root {
                path: config.root.clone(),
                source,
            })?;
            info!(root = %config.root.display(), "created document root");
        }

        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

        Ok(Self {
            resolver: Arc::new(Resolver::new(
                config.root.clone(),
                config.default_pages.clone(),
            )),
            admission: Admission::new(config.max_connect),
            settings: ConnectionSettings::from_config(&config),
            listener,
        })
    }

    /// Dirección real de escucha (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Control de admisión compartido con los workers
    pub fn admission(&self) -> Arc<Admission> {
        Arc::clone(&self.admission)
    }

    /// Acepta conexiones para siempre
    ///
    /// Los errores de `accept` se registran y el loop sigue; los únicos
    /// errores fatales ocurren en [`Server::new`].
    pub fn run(&self) -> ! {
        let address = self
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        info!(
            %address,
            root = %self.resolver.root().display(),
            default_pages = ?self.resolver.default_pages(),
            limit = self.admission.limit(),
            "listening, one thread per connection"
        );

        loop {
            self.accept_one();
        }
    }

    /// Espera un lugar libre, acepta una conexión y la despacha a un thread
    ///
    /// Un fallo de `accept` libera el lugar al descartar el permiso.
    pub fn accept_one(&self) {
        let permit = self.admission.acquire();

        match self.listener.accept() {
            Ok((stream, peer)) => self.dispatch(stream, peer, permit),
            Err(err) => warn!(error = %err, "failed to accept connection"),
        }
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr, permit: Permit) {
        let resolver = Arc::clone(&self.resolver);
        let settings = self.settings.clone();
        debug!(%peer, active = self.admission.active(), "connection accepted");

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let _permit = permit;
                if let Err(err) = handle_connection(stream, &resolver, &settings) {
                    warn!(%peer, error = %err, "connection ended with an error");
                }
            });

        if let Err(err) = spawned {
            error!(%peer, error = %err, "failed to spawn connection thread");
        }
    }
}

/// Atiende una conexión completa: leer, resolver, responder y cerrar
pub fn handle_connection(
    mut stream: TcpStream,
    resolver: &Resolver,
    settings: &ConnectionSettings,
) -> io::Result<()> {
    let start = Instant::now();
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let response = match read_request(&mut stream, settings) {
        Ok(Some(request)) => {
            let response = resolver.resolve(&request);
            info!(
                %peer,
                method = request.method(),
                path = request.path(),
                status = response.status().as_u16(),
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "request served"
            );
            response
        }
        Ok(None) => {
            debug!(%peer, "peer closed before sending a complete request");
            return Ok(());
        }
        Err(ReadError::Malformed(err)) => {
            warn!(%peer, error = %err, "malformed request");
            let response = Response::new(FALLBACK_VERSION, err.status());
            return reply_and_linger(stream, response, settings);
        }
        Err(ReadError::TimedOut) => {
            warn!(%peer, "request not received in time");
            let response = Response::new(FALLBACK_VERSION, StatusCode::RequestTimeout);
            return reply_and_linger(stream, response, settings);
        }
        Err(ReadError::Io(err)) => return Err(err),
    };

    write_response(&mut stream, &response, settings)
}

fn write_response(
    stream: &mut TcpStream,
    response: &Response,
    settings: &ConnectionSettings,
) -> io::Result<()> {
    stream.set_write_timeout(Some(settings.write_timeout))?;
    stream.write_all(&response.to_bytes())?;
    stream.flush()
}

/// Responde un error cuando el cliente quizás todavía está enviando
///
/// Cerrar con bytes sin leer en el socket hace que el kernel mande RST y el
/// cliente pierda la respuesta. Se cierra la escritura y se descarta lo que
/// llegue, con límite de tiempo y de bytes.
fn reply_and_linger(
    mut stream: TcpStream,
    response: Response,
    settings: &ConnectionSettings,
) -> io::Result<()> {
    write_response(&mut stream, &response, settings)?;
    if let Err(err) = stream.shutdown(Shutdown::Write) {
        debug!(error = %err, "peer already gone");
        return Ok(());
    }

    let deadline = Instant::now() + LINGER_TIMEOUT;
    let mut chunk = [0u8; 4096];
    let mut drained = 0;

    while drained < LINGER_MAX_BYTES {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        stream.set_read_timeout(Some(remaining))?;

        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => drained += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }

    trace!(drained, "discarded trailing bytes before closing");
    Ok(())
}

/// Lee hasta completar un request
///
/// `Ok(None)` si el cliente cerró antes de terminar.
fn read_request(
    stream: &mut TcpStream,
    settings: &ConnectionSettings,
) -> Result<Option<Request>, ReadError> {
    let deadline = Instant::now() + settings.request_timeout;
    let mut parser =
        RequestParser::new(settings.max_head_bytes).with_max_body(settings.max_body_bytes);
    let mut chunk = vec![0u8; settings.recv_buf_size];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ReadError::TimedOut);
        }
        stream
            .set_read_timeout(Some(remaining.min(settings.read_timeout)))
            .map_err(ReadError::Io)?;

        let received = match stream.read(&mut chunk) {
            Ok(0) => return Ok(None),
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Err(ReadError::TimedOut)
            }
            Err(err) => return Err(ReadError::Io(err)),
        };

        match parser.feed(&chunk[..received]).map_err(ReadError::Malformed)? {
            Parse::Complete(request) => return Ok(Some(request)),
            Parse::NeedMoreData => trace!(buffered = parser.buffered(), "waiting for more bytes"),
        }
    }
}

#[cfg(test)]
mod more_server_tests {
    use super::*;
    use std::path::PathBuf;

    fn ephemeral_listener() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").expect("bind")
    }

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            recv_buf_size: 16,
            read_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            max_head_bytes: 1024,
            max_body_bytes: 4096,
        }
    }

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docserve-tcp-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Acepta una conexión en un thread, ejecuta el `client` y devuelve lo recibido
    fn exchange(
        root: PathBuf,
        settings: ConnectionSettings,
        client: impl FnOnce(&mut TcpStream),
    ) -> String {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let resolver = Resolver::new(root, vec!["index.html".to_string()]);
            handle_connection(stream, &resolver, &settings).unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        client(&mut stream);

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        drop(stream);
        server.join().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_handle_connection_serves_file() {
        let root = temp_root("serve");
        fs::write(root.join("index.html"), "hello world!").unwrap();

        let text = exchange(root.clone(), settings(), |client| {
            client
                .write_all(b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n")
                .unwrap();
        });
        let _ = fs::remove_dir_all(&root);

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nhello world!"));
        assert!(!text.contains("Content-Length"));
    }

    #[test]
    fn test_handle_connection_request_in_pieces() {
        let root = temp_root("pieces");
        fs::write(root.join("index.html"), "pieces").unwrap();

        let text = exchange(root.clone(), settings(), |client| {
            for piece in ["GET / HT", "TP/1.0\r\nHo", "st: x\r\n", "\r\n"] {
                client.write_all(piece.as_bytes()).unwrap();
                client.flush().unwrap();
                thread::sleep(Duration::from_millis(20));
            }
        });
        let _ = fs::remove_dir_all(&root);

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.ends_with("pieces"));
    }

    #[test]
    fn test_handle_connection_missing_file() {
        let root = temp_root("missing");

        let text = exchange(root.clone(), settings(), |client| {
            client.write_all(b"GET /nope HTTP/1.1\r\n\r\n").unwrap();
        });
        let _ = fs::remove_dir_all(&root);

        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("<h1>404 Not Found</h1>"));
    }

    #[test]
    fn test_handle_connection_parse_error() {
        let root = temp_root("garbage");

        let text = exchange(root.clone(), settings(), |client| {
            client.write_all(b"\x00\x01\x02\x03garbage\r\n").unwrap();
        });
        let _ = fs::remove_dir_all(&root);

        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[test]
    fn test_handle_connection_head_too_large() {
        let root = temp_root("large");
        let mut limited = settings();
        limited.max_head_bytes = 32;

        let text = exchange(root.clone(), limited, |client| {
            client
                .write_all(b"GET /aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
                .unwrap();
        });
        let _ = fs::remove_dir_all(&root);

        assert!(text.starts_with("HTTP/1.1 413 Request Entity Too Large\r\n"));
    }

    #[test]
    fn test_handle_connection_bad_start_line_with_trailing_bytes() {
        let root = temp_root("trailing");

        let text = exchange(root.clone(), settings(), |client| {
            let mut raw = b"this is not http\r\n".to_vec();
            raw.extend(std::iter::repeat(b'j').take(4096));
            client.write_all(&raw).unwrap();
        });
        let _ = fs::remove_dir_all(&root);

        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"), "got: {}", text);
    }

    #[test]
    fn test_handle_connection_oversized_head_with_trailing_bytes() {
        let root = temp_root("bighead");
        let mut limited = settings();
        limited.max_head_bytes = 256;

        let text = exchange(root.clone(), limited, |client| {
            let mut raw = b"GET / HTTP/1.1\r\nX-Big: ".to_vec();
            raw.extend(std::iter::repeat(b'a').take(8 * 1024));
            raw.extend_from_slice(b"\r\n\r\n");
            client.write_all(&raw).unwrap();
        });
        let _ = fs::remove_dir_all(&root);

        assert!(
            text.starts_with("HTTP/1.1 413 Request Entity Too Large\r\n"),
            "got: {}",
            text
        );
    }

    #[test]
    fn test_handle_connection_declared_body_too_large() {
        let root = temp_root("bigbody");

        let text = exchange(root.clone(), settings(), |client| {
            let mut raw = b"POST / HTTP/1.1\r\nContent-Length: 100000\r\n\r\n".to_vec();
            raw.extend(std::iter::repeat(b'b').take(4096));
            client.write_all(&raw).unwrap();
        });
        let _ = fs::remove_dir_all(&root);

        assert!(
            text.starts_with("HTTP/1.1 413 Request Entity Too Large\r\n"),
            "got: {}",
            text
        );
    }

    #[test]
    fn test_handle_connection_timeout() {
        let root = temp_root("timeout");
        let mut impatient = settings();
        impatient.read_timeout = Duration::from_millis(100);

        let text = exchange(root.clone(), impatient, |client| {
            client.write_all(b"GET / HTTP/1.1\r\nHost").unwrap();
        });
        let _ = fs::remove_dir_all(&root);

        assert!(text.starts_with("HTTP/1.1 408 Request Timeout\r\n"));
    }

    #[test]
    fn test_handle_connection_total_deadline() {
        let root = temp_root("deadline");
        let mut impatient = settings();
        impatient.request_timeout = Duration::from_millis(150);

        let text = exchange(root.clone(), impatient, |client| {
            for _ in 0..3 {
                client.write_all(b"X").unwrap();
                thread::sleep(Duration::from_millis(40));
            }
        });
        let _ = fs::remove_dir_all(&root);

        assert!(text.starts_with("HTTP/1.1 408 Request Timeout\r\n"));
    }

    #[test]
    fn test_handle_connection_peer_closed_immediately() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let root = temp_root("closed");

        let server = thread::spawn({
            let root = root.clone();
            move || {
                let (stream, _) = listener.accept().unwrap();
                let resolver = Resolver::new(root, vec!["index.html".to_string()]);
                handle_connection(stream, &resolver, &settings()).unwrap();
            }
        });

        drop(TcpStream::connect(addr).unwrap());
        server.join().unwrap();
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_server_creates_missing_root() {
        let root = std::env::temp_dir()
            .join(format!("docserve-tcp-newroot-{}", std::process::id()))
            .join("nested");
        let _ = fs::remove_dir_all(&root);

        let config = Config {
            port: 0,
            root: root.clone(),
            ..Config::default()
        };
        let server = Server::new(config).unwrap();

        assert!(root.is_dir());
        assert_ne!(server.local_addr().unwrap().port(), 0);
        assert_eq!(server.admission().limit(), 64);
        let _ = fs::remove_dir_all(root.parent().unwrap());
    }

    #[test]
    fn test_accept_one_releases_slot_after_response() {
        let root = temp_root("accept");
        fs::write(root.join("index.html"), "ok").unwrap();
        let config = Config {
            port: 0,
            root: root.clone(),
            max_connect: 1,
            ..Config::default()
        };
        let server = Server::new(config).unwrap();
        let addr = server.local_addr().unwrap();
        let admission = server.admission();

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        server.accept_one();

        let mut buf = String::new();
        client.read_to_string(&mut buf).unwrap();
        assert!(buf.starts_with("HTTP/1.1 200 OK"));

        let deadline = Instant::now() + Duration::from_secs(5);
        while admission.active() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(admission.active(), 0);
        assert_eq!(admission.peak(), 1);
        let _ = fs::remove_dir_all(&root);
    }
}
