//! # Parser incremental de Requests
//! src/http/parser.rs
//!
//! Los bytes llegan del socket en pedazos. El parser los acumula y avanza un
//! cursor a medida que reconoce cada parte, sin volver a escanear lo que ya
//! consumió:
//!
//! ```text
//! AwaitingStartLine ──► AwaitingHeaders ──► AwaitingBody ──► Complete
//!   "GET / HTTP/1.1"     "Host: x" ...       Content-Length
//! ```
//!
//! Cada llamada a [`RequestParser::feed`] tiene tres resultados posibles:
//! - `Ok(Parse::NeedMoreData)`: el request todavía no terminó de llegar
//! - `Ok(Parse::Complete(request))`: request completo
//! - `Err(ParseError)`: los bytes no forman un request válido
//!
//! Una línea se considera mal formada solo cuando ya llegó su `\r\n` y no
//! respeta la gramática; una línea a medias siempre es "faltan datos".

use super::{Request, StatusCode};
use regex::bytes::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::trace;

/// `METHOD SP TARGET SP VERSION CRLF`
fn start_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Z]+) (\S+) (\S+)\r\n$").expect("start line pattern is valid")
    })
}

/// `NAME: VALUE CRLF`; el valor puede tener espacios internos
fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^\s:]+): ?([\S ]*)\r\n$").expect("header pattern is valid")
    })
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// La línea inicial no es `METHOD TARGET VERSION`
    #[error("invalid request line")]
    InvalidStartLine,

    /// Header sin el formato `Name: Value`
    #[error("invalid header line: {0:?}")]
    InvalidHeader(String),

    /// Content-Length que no es un número
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// Request line + headers superan el límite configurado
    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    /// Content-Length declara más bytes de los que se aceptan
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    /// Se alimentó el parser después de completar el request
    #[error("request already complete")]
    Finished,
}

impl ParseError {
    /// Código de estado con el que se responde a este error
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::InvalidStartLine
            | ParseError::InvalidHeader(_)
            | ParseError::InvalidContentLength(_) => StatusCode::BadRequest,
            ParseError::HeadTooLarge(_) | ParseError::BodyTooLarge(_) => {
                StatusCode::RequestEntityTooLarge
            }
            ParseError::Finished => StatusCode::InternalServerError,
        }
    }
}

/// Resultado de alimentar el parser sin error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parse {
    /// Faltan bytes para completar el request
    NeedMoreData,

    /// Request completo
    Complete(Request),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingStartLine,
    AwaitingHeaders,
    AwaitingBody { content_length: Option<usize> },
    Complete,
}

/// Parser incremental: un parser por conexión
#[derive(Debug)]
pub struct RequestParser {
    /// Bytes recibidos hasta ahora
    buffer: Vec<u8>,

    /// Posición del primer byte todavía no consumido
    cursor: usize,

    state: State,

    /// Request en construcción
    request: Request,

    /// Máximo de bytes para request line + headers
    max_head_bytes: usize,

    /// Máximo que puede declarar Content-Length
    max_body_bytes: usize,
}

impl RequestParser {
    /// Crea un parser que acepta una cabecera de hasta `max_head_bytes`
    pub fn new(max_head_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
            state: State::AwaitingStartLine,
            request: Request::default(),
            max_head_bytes,
            max_body_bytes: usize::MAX,
        }
    }

    /// Limita el Content-Length aceptado; uno mayor es `BodyTooLarge`
    pub fn with_max_body(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Bytes acumulados hasta ahora
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Agrega un pedazo de bytes y avanza lo más posible
    ///
    /// # Ejemplo
    /// ```
    /// use docserve::http::parser::{Parse, RequestParser};
    ///
    /// let mut parser = RequestParser::new(8192);
    /// assert_eq!(parser.feed(b"GET / HTT").unwrap(), Parse::NeedMoreData);
    ///
    /// match parser.feed(b"P/1.1\r\n\r\n").unwrap() {
    ///     Parse::Complete(request) => assert_eq!(request.path(), "/"),
    ///     Parse::NeedMoreData => panic!("request should be complete"),
    /// }
    /// ```
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Parse, ParseError> {
        if self.state == State::Complete {
            return Err(ParseError::Finished);
        }
        self.buffer.extend_from_slice(chunk);

        loop {
            match self.state {
                State::AwaitingStartLine => {
                    let Some(line) = self.next_line()? else {
                        return Ok(Parse::NeedMoreData);
                    };
                    let caps = start_line_pattern()
                        .captures(&self.buffer[self.cursor..self.cursor + line])
                        .ok_or(ParseError::InvalidStartLine)?;

                    let method = String::from_utf8_lossy(&caps[1]).into_owned();
                    let target = String::from_utf8_lossy(&caps[2]).into_owned();
                    let version = String::from_utf8_lossy(&caps[3]).into_owned();
                    trace!(%method, %target, %version, "request line");

                    self.request.method = method;
                    self.request.version = version;
                    self.request.set_target(&target);
                    self.cursor += line;
                    self.state = State::AwaitingHeaders;
                }
                State::AwaitingHeaders => {
                    if self.buffer[self.cursor..].starts_with(b"\r\n") {
                        self.cursor += 2;
                        let content_length = self.content_length()?;
                        self.state = State::AwaitingBody { content_length };
                        continue;
                    }

                    let Some(line) = self.next_line()? else {
                        return Ok(Parse::NeedMoreData);
                    };
                    let raw = &self.buffer[self.cursor..self.cursor + line];
                    let caps = header_pattern().captures(raw).ok_or_else(|| {
                        ParseError::InvalidHeader(
                            String::from_utf8_lossy(&raw[..raw.len() - 2]).into_owned(),
                        )
                    })?;

                    let name = String::from_utf8_lossy(&caps[1]).into_owned();
                    let value = String::from_utf8_lossy(&caps[2]).into_owned();
                    self.request.headers.insert(name, value);
                    self.cursor += line;
                }
                State::AwaitingBody { content_length } => {
                    let body = &self.buffer[self.cursor..];
                    if let Some(expected) = content_length {
                        if body.len() < expected {
                            trace!(received = body.len(), expected, "waiting for body");
                            return Ok(Parse::NeedMoreData);
                        }
                    }

                    let mut request = std::mem::take(&mut self.request);
                    request.body = body.to_vec();
                    let form = String::from_utf8_lossy(&request.body).into_owned();
                    request.merge_parameters(&form);

                    self.state = State::Complete;
                    return Ok(Parse::Complete(request));
                }
                State::Complete => return Err(ParseError::Finished),
            }
        }
    }

    /// Largo (incluyendo `\r\n`) de la línea que empieza en el cursor, si ya llegó
    ///
    /// Falla si la cabecera supera `max_head_bytes`.
    fn next_line(&self) -> Result<Option<usize>, ParseError> {
        let pending = &self.buffer[self.cursor..];
        match pending.windows(2).position(|w| w == b"\r\n") {
            Some(end) if self.cursor + end + 2 > self.max_head_bytes => {
                Err(ParseError::HeadTooLarge(self.max_head_bytes))
            }
            Some(end) => Ok(Some(end + 2)),
            None if self.buffer.len() > self.max_head_bytes => {
                Err(ParseError::HeadTooLarge(self.max_head_bytes))
            }
            None => Ok(None),
        }
    }

    /// Valor de `Content-Length`, buscado con el nombre exacto como el resto
    /// de los headers
    fn content_length(&self) -> Result<Option<usize>, ParseError> {
        let Some(value) = self.request.headers.get("Content-Length") else {
            return Ok(None);
        };
        let length = value
            .trim()
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidContentLength(value.clone()))?;

        if length > self.max_body_bytes {
            return Err(ParseError::BodyTooLarge(self.max_body_bytes));
        }
        Ok(Some(length))
    }
}

impl Request {
    /// Parsea un buffer completo desde cero
    ///
    /// # Retorna
    ///
    /// * `Ok(Some(Request))` - Request completo
    /// * `Ok(None)` - Faltan bytes
    /// * `Err(ParseError)` - El buffer no es un request válido
    ///
    /// No guarda estado entre llamadas: se puede reintentar con el buffer
    /// creciendo y el resultado solo depende de los bytes recibidos.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use docserve::http::Request;
    ///
    /// let raw = b"GET /index.html?lang=es HTTP/1.1\r\nHost: x\r\n\r\n";
    /// let request = Request::parse(raw).unwrap().unwrap();
    ///
    /// assert_eq!(request.path(), "/index.html");
    /// assert_eq!(request.parameter("lang"), Some("es"));
    /// assert!(Request::parse(&raw[..10]).unwrap().is_none());
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Option<Request>, ParseError> {
        match RequestParser::new(usize::MAX).feed(buffer)? {
            Parse::Complete(request) => Ok(Some(request)),
            Parse::NeedMoreData => Ok(None),
        }
    }
}
