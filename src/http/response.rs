//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Este módulo proporciona una API para construir respuestas HTTP/1.1
//! y convertirlas a bytes para enviar al cliente.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.1 404 Not Found\r\n
//! \r\n
//! <html><body><h1>404 Not Found</h1><p>Nothing matches the given URI</p></body></html>
//! ```
//!
//! Al fijar un código de estado el body se reemplaza por una página HTML que
//! describe el código. Quien necesite otro contenido (ej: un archivo) debe
//! fijar el estado primero y el body después.
//!
//! `Content-Length` no se calcula automáticamente: si se quiere, hay que
//! agregarlo como cualquier otro header.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use docserve::http::{Response, StatusCode};
//!
//! let mut response = Response::new("HTTP/1.1", StatusCode::Ok);
//! response.set_data(b"hello world!".to_vec());
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::status::StatusError;
use super::{HttpMessage, StatusCode};

/// Representa una respuesta HTTP completa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Versión del protocolo (se copia de la del request)
    version: String,

    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers en orden de inserción
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta
    data: Vec<u8>,
}

/// Página HTML generada para un código de estado
fn status_page(status: StatusCode) -> Vec<u8> {
    format!(
        "<html><body><h1>{} {}</h1><p>{}</p></body></html>",
        status.as_u16(),
        status.reason_phrase(),
        status.description()
    )
    .into_bytes()
}

impl Response {
    /// Crea una respuesta con el código dado y su página HTML como body
    pub fn new(version: &str, status: StatusCode) -> Self {
        Self {
            version: version.to_string(),
            status,
            headers: Vec::new(),
            data: status_page(status),
        }
    }

    /// Crea una respuesta a partir de un código numérico
    ///
    /// # Errores
    ///
    /// `StatusError::Unknown` si el código no está registrado
    pub fn from_code(version: &str, code: u16) -> Result<Self, StatusError> {
        StatusCode::from_u16(code).map(|status| Self::new(version, status))
    }

    /// Cambia el código de estado y regenera el body con la página del código
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.data = status_page(status);
    }

    /// Reemplaza el body (ej: con el contenido de un archivo)
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    /// Agrega un header. Si ya existe se reemplaza el valor en su misma posición.
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Versión builder de [`Response::add_header`]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.1 200 OK\r\n`
    /// - Headers: `Header-Name: Value\r\n`, en orden de inserción
    /// - Línea vacía: `\r\n`
    /// - Body: bytes crudos, sin recodificar
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "{} {} {}\r\n",
            self.version,
            self.status.as_u16(),
            self.status.reason_phrase()
        );

        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        let mut result = head.into_bytes();
        result.extend_from_slice(&self.data);
        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Código en forma de texto (ej: "200")
    pub fn code(&self) -> String {
        self.status.as_u16().to_string()
    }

    /// Reason phrase del código (ej: "OK")
    pub fn reason(&self) -> &'static str {
        self.status.reason_phrase()
    }

    /// Obtiene los headers en orden
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Obtiene el body
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl HttpMessage for Response {
    fn version(&self) -> &str {
        &self.version
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn body(&self) -> &[u8] {
        &self.data
    }
}
