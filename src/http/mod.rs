//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Este módulo implementa el modelo de mensajes HTTP/1.1 desde cero. Incluye:
//!
//! - Tabla de códigos de estado
//! - Requests y su parser incremental
//! - Construcción y serialización de responses
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Last-Modified: Fri, 23 Oct 2009 08:06:04 GMT\r\n
//! \r\n
//! hello world!
//! ```
//!
//! No hay chunked encoding ni conexiones persistentes: un request por conexión.

pub mod message;
pub mod parser;
pub mod request;
pub mod response;
pub mod status;

// Re-exportamos los tipos principales para facilitar su uso
pub use message::HttpMessage;
pub use parser::{Parse, ParseError, RequestParser};
pub use request::Request;
pub use response::Response;
pub use status::{StatusCode, StatusError};
