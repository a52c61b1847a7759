//! # Requests HTTP/1.1
//! src/http/request.rs
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /login?lang=es HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 7\r\n
//! \r\n
//! a=1&b=2
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query VERSION`
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: `\r\n` que separa headers del body
//! 4. **Body**: bytes restantes; si es un formulario se mezcla en `parameters`
//!
//! El parsing en sí vive en [`crate::http::parser`].

use super::HttpMessage;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Pares `clave=valor` separados por `&`. Las claves son alfanuméricas y el
/// valor es todo lo que sigue hasta el próximo `&`.
fn parameter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|&)([a-zA-Z0-9]+)=([^&]*)").expect("parameter pattern is valid")
    })
}

/// Decodifica secuencias `%XX` del path
///
/// Una secuencia incompleta o que no es hexadecimal se deja literal. Los bytes
/// que no forman UTF-8 válido se reemplazan por U+FFFD.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let escaped = match bytes.get(i + 1..i + 3) {
            Some(&[hi, lo]) if bytes[i] == b'%' => hex_value(hi).zip(hex_value(lo)),
            _ => None,
        };
        match escaped {
            Some((hi, lo)) => {
                decoded.push(hi << 4 | lo);
                i += 3;
            }
            None => {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|value| value as u8)
}

/// Representa un request HTTP parseado
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Método HTTP tal como llegó (ej: "GET")
    pub(crate) method: String,

    /// Path decodificado, sin la query string (ej: "/index.html")
    pub(crate) path: String,

    /// Parámetros de la query string y del body (formulario)
    pub(crate) parameters: HashMap<String, String>,

    /// Headers HTTP (ej: {"Host": "localhost:8080"})
    pub(crate) headers: HashMap<String, String>,

    /// Versión HTTP (ej: "HTTP/1.1")
    pub(crate) version: String,

    /// Body del request
    pub(crate) body: Vec<u8>,
}

impl Request {
    /// Separa el target en path y query string, mezclando la query en los parámetros
    ///
    /// Ejemplo: "/search?q=rust&page=2"
    /// Deja: path = "/search", parameters = {"q": "rust", "page": "2"}
    ///
    /// El path se decodifica (`%20` → espacio); la query queda tal cual.
    pub(crate) fn set_target(&mut self, target: &str) {
        match target.split_once('?') {
            Some((path, query)) => {
                self.path = percent_decode(path);
                self.merge_parameters(query);
            }
            None => self.path = percent_decode(target),
        }
    }

    /// Mezcla pares `clave=valor` en los parámetros
    ///
    /// Una clave repetida se sobrescribe: gana la última que se parsea.
    pub(crate) fn merge_parameters(&mut self, source: &str) {
        for caps in parameter_pattern().captures_iter(source) {
            self.parameters
                .insert(caps[1].to_string(), caps[2].to_string());
        }
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene todos los parámetros (query string + formulario)
    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    /// Obtiene un parámetro específico
    ///
    /// # Ejemplo
    /// ```
    /// use docserve::http::Request;
    ///
    /// let request = Request::parse(b"GET /test?num=42 HTTP/1.1\r\n\r\n")
    ///     .unwrap()
    ///     .unwrap();
    ///
    /// assert_eq!(request.parameter("num"), Some("42"));
    /// assert_eq!(request.parameter("missing"), None);
    /// ```
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(|s| s.as_str())
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

impl HttpMessage for Request {
    fn version(&self) -> &str {
        &self.version
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_without_query() {
        let mut request = Request::default();
        request.set_target("/docs/index.html");

        assert_eq!(request.path(), "/docs/index.html");
        assert!(request.parameters().is_empty());
    }

    #[test]
    fn test_target_with_query() {
        let mut request = Request::default();
        request.set_target("/search?q=rust&page=2");

        assert_eq!(request.path(), "/search");
        assert_eq!(request.parameter("q"), Some("rust"));
        assert_eq!(request.parameter("page"), Some("2"));
    }

    #[test]
    fn test_path_is_percent_decoded() {
        let mut request = Request::default();
        request.set_target("/my%20file.html?name=a%20b");

        assert_eq!(request.path(), "/my file.html");
        assert_eq!(request.parameter("name"), Some("a%20b"));
    }

    #[test]
    fn test_invalid_escapes_stay_literal() {
        assert_eq!(percent_decode("/100%"), "/100%");
        assert_eq!(percent_decode("/a%zzb"), "/a%zzb");
        assert_eq!(percent_decode("/%2e%2E/x"), "/../x");
        assert_eq!(percent_decode("/caf%C3%A9"), "/café");
    }

    #[test]
    fn test_only_first_question_mark_splits() {
        let mut request = Request::default();
        request.set_target("/a?x=1?2");

        assert_eq!(request.path(), "/a");
        assert_eq!(request.parameter("x"), Some("1?2"));
    }

    #[test]
    fn test_repeated_key_last_wins() {
        let mut request = Request::default();
        request.merge_parameters("a=1&a=2");

        assert_eq!(request.parameter("a"), Some("2"));
    }

    #[test]
    fn test_non_alphanumeric_keys_are_skipped() {
        let mut request = Request::default();
        request.merge_parameters("my-key=1&ok=2&=3&flag");

        assert_eq!(request.parameter("my-key"), None);
        assert_eq!(request.parameter("ok"), Some("2"));
        assert_eq!(request.parameters().len(), 1);
    }

    #[test]
    fn test_empty_value_and_raw_value() {
        let mut request = Request::default();
        request.merge_parameters("empty=&text=hello%20world");

        assert_eq!(request.parameter("empty"), Some(""));
        assert_eq!(request.parameter("text"), Some("hello%20world"));
    }

    #[test]
    fn test_header_lookup_is_case_sensitive() {
        let mut request = Request::default();
        request.headers.insert("Host".to_string(), "x".to_string());

        assert_eq!(request.header("Host"), Some("x"));
        assert_eq!(request.header("host"), None);
    }
}
