//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Tabla estática de códigos de estado HTTP/1.1. Es la única fuente de los
//! textos legibles: cada código tiene su *reason phrase* y una descripción
//! larga que se usa al generar la página HTML de la respuesta.
//!
//! - **1xx**: Informacional (100, 101)
//! - **2xx**: Éxito (200–206)
//! - **3xx**: Redirección (300–305, 307)
//! - **4xx**: Error del cliente (400–417)
//! - **5xx**: Error del servidor (500–505)

use thiserror::Error;

/// Error al buscar un código que no está registrado en la tabla
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("unregistered status code: {0}")]
    Unknown(u16),
}

/// Todos los códigos de estado que conoce el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Continue = 100,
    SwitchingProtocols = 101,

    Ok = 200,
    Created = 201,
    Accepted = 202,
    NonAuthoritativeInformation = 203,
    NoContent = 204,
    ResetContent = 205,
    PartialContent = 206,

    MultipleChoices = 300,
    MovedPermanently = 301,
    Found = 302,
    SeeOther = 303,
    NotModified = 304,
    UseProxy = 305,
    TemporaryRedirect = 307,

    BadRequest = 400,
    Unauthorized = 401,
    PaymentRequired = 402,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    NotAcceptable = 406,
    ProxyAuthenticationRequired = 407,
    RequestTimeout = 408,
    Conflict = 409,
    Gone = 410,
    LengthRequired = 411,
    PreconditionFailed = 412,
    RequestEntityTooLarge = 413,
    RequestUriTooLong = 414,
    UnsupportedMediaType = 415,
    RequestedRangeNotSatisfiable = 416,
    ExpectationFailed = 417,

    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    GatewayTimeout = 504,
    HttpVersionNotSupported = 505,
}

impl StatusCode {
    /// Todos los códigos registrados, en orden numérico
    pub const ALL: [StatusCode; 40] = [
        StatusCode::Continue,
        StatusCode::SwitchingProtocols,
        StatusCode::Ok,
        StatusCode::Created,
        StatusCode::Accepted,
        StatusCode::NonAuthoritativeInformation,
        StatusCode::NoContent,
        StatusCode::ResetContent,
        StatusCode::PartialContent,
        StatusCode::MultipleChoices,
        StatusCode::MovedPermanently,
        StatusCode::Found,
        StatusCode::SeeOther,
        StatusCode::NotModified,
        StatusCode::UseProxy,
        StatusCode::TemporaryRedirect,
        StatusCode::BadRequest,
        StatusCode::Unauthorized,
        StatusCode::PaymentRequired,
        StatusCode::Forbidden,
        StatusCode::NotFound,
        StatusCode::MethodNotAllowed,
        StatusCode::NotAcceptable,
        StatusCode::ProxyAuthenticationRequired,
        StatusCode::RequestTimeout,
        StatusCode::Conflict,
        StatusCode::Gone,
        StatusCode::LengthRequired,
        StatusCode::PreconditionFailed,
        StatusCode::RequestEntityTooLarge,
        StatusCode::RequestUriTooLong,
        StatusCode::UnsupportedMediaType,
        StatusCode::RequestedRangeNotSatisfiable,
        StatusCode::ExpectationFailed,
        StatusCode::InternalServerError,
        StatusCode::NotImplemented,
        StatusCode::BadGateway,
        StatusCode::ServiceUnavailable,
        StatusCode::GatewayTimeout,
        StatusCode::HttpVersionNotSupported,
    ];

    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use docserve::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Busca el código a partir de su valor numérico
    ///
    /// # Errores
    ///
    /// `StatusError::Unknown` si el código no está en la tabla
    pub fn from_u16(code: u16) -> Result<Self, StatusError> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_u16() == code)
            .ok_or(StatusError::Unknown(code))
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use docserve::http::StatusCode;
    /// assert_eq!(StatusCode::NotModified.reason_phrase(), "Not Modified");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        self.entry().0
    }

    /// Retorna la descripción larga que acompaña a la página generada
    pub fn description(&self) -> &'static str {
        self.entry().1
    }

    fn entry(&self) -> (&'static str, &'static str) {
        match self {
            StatusCode::Continue => ("Continue", "Request received, please continue"),
            StatusCode::SwitchingProtocols => (
                "Switching Protocols",
                "Switching to new protocol; obey Upgrade header",
            ),

            StatusCode::Ok => ("OK", "Request fulfilled, document follows"),
            StatusCode::Created => ("Created", "Document created, URL follows"),
            StatusCode::Accepted => (
                "Accepted",
                "Request accepted, processing continues off-line",
            ),
            StatusCode::NonAuthoritativeInformation => (
                "Non-Authoritative Information",
                "Request fulfilled from cache",
            ),
            StatusCode::NoContent => ("No Content", "Request fulfilled, nothing follows"),
            StatusCode::ResetContent => ("Reset Content", "Clear input form for further input."),
            StatusCode::PartialContent => ("Partial Content", "Partial content follows."),

            StatusCode::MultipleChoices => (
                "Multiple Choices",
                "Object has several resources -- see URI list",
            ),
            StatusCode::MovedPermanently => (
                "Moved Permanently",
                "Object moved permanently -- see URI list",
            ),
            StatusCode::Found => ("Found", "Object moved temporarily -- see URI list"),
            StatusCode::SeeOther => ("See Other", "Object moved -- see Method and URL list"),
            StatusCode::NotModified => (
                "Not Modified",
                "Document has not changed since given time",
            ),
            StatusCode::UseProxy => (
                "Use Proxy",
                "You must use proxy specified in Location to access this resource.",
            ),
            StatusCode::TemporaryRedirect => (
                "Temporary Redirect",
                "Object moved temporarily -- see URI list",
            ),

            StatusCode::BadRequest => ("Bad Request", "Bad request syntax or unsupported method"),
            StatusCode::Unauthorized => (
                "Unauthorized",
                "No permission -- see authorization schemes",
            ),
            StatusCode::PaymentRequired => ("Payment Required", "No payment -- see charging schemes"),
            StatusCode::Forbidden => (
                "Forbidden",
                "Request forbidden -- authorization will not help",
            ),
            StatusCode::NotFound => ("Not Found", "Nothing matches the given URI"),
            StatusCode::MethodNotAllowed => (
                "Method Not Allowed",
                "Specified method is invalid for this resource.",
            ),
            StatusCode::NotAcceptable => ("Not Acceptable", "URI not available in preferred format."),
            StatusCode::ProxyAuthenticationRequired => (
                "Proxy Authentication Required",
                "You must authenticate with this proxy before proceeding.",
            ),
            StatusCode::RequestTimeout => ("Request Timeout", "Request timed out; try again later."),
            StatusCode::Conflict => ("Conflict", "Request conflict."),
            StatusCode::Gone => (
                "Gone",
                "URI no longer exists and has been permanently removed.",
            ),
            StatusCode::LengthRequired => ("Length Required", "Client must specify Content-Length."),
            StatusCode::PreconditionFailed => (
                "Precondition Failed",
                "Precondition in headers is false.",
            ),
            StatusCode::RequestEntityTooLarge => ("Request Entity Too Large", "Entity is too large."),
            StatusCode::RequestUriTooLong => ("Request-URI Too Long", "URI is too long."),
            StatusCode::UnsupportedMediaType => (
                "Unsupported Media Type",
                "Entity body in unsupported format.",
            ),
            StatusCode::RequestedRangeNotSatisfiable => (
                "Requested Range Not Satisfiable",
                "Cannot satisfy request range.",
            ),
            StatusCode::ExpectationFailed => (
                "Expectation Failed",
                "Expect condition could not be satisfied.",
            ),

            StatusCode::InternalServerError => (
                "Internal Server Error",
                "Server got itself in trouble",
            ),
            StatusCode::NotImplemented => (
                "Not Implemented",
                "Server does not support this operation",
            ),
            StatusCode::BadGateway => (
                "Bad Gateway",
                "Invalid responses from another server/proxy.",
            ),
            StatusCode::ServiceUnavailable => (
                "Service Unavailable",
                "The server cannot process the request due to a high load",
            ),
            StatusCode::GatewayTimeout => (
                "Gateway Timeout",
                "The gateway server did not receive a timely response",
            ),
            StatusCode::HttpVersionNotSupported => (
                "HTTP Version Not Supported",
                "Cannot fulfill request.",
            ),
        }
    }
}

/// Busca `(reason phrase, descripción)` para un código numérico
///
/// # Ejemplo
/// ```
/// use docserve::http::status::lookup;
///
/// let (phrase, _) = lookup(404).unwrap();
/// assert_eq!(phrase, "Not Found");
/// assert!(lookup(299).is_err());
/// ```
pub fn lookup(code: u16) -> Result<(&'static str, &'static str), StatusError> {
    StatusCode::from_u16(code).map(|status| status.entry())
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::NotModified.as_u16(), 304);
        assert_eq!(StatusCode::Forbidden.as_u16(), 403);
        assert_eq!(StatusCode::HttpVersionNotSupported.as_u16(), 505);
    }

    #[test]
    fn test_from_u16_round_trips_every_code() {
        for status in StatusCode::ALL {
            assert_eq!(StatusCode::from_u16(status.as_u16()), Ok(status));
        }
    }

    #[test]
    fn test_registered_ranges() {
        let codes: Vec<u16> = StatusCode::ALL.iter().map(|s| s.as_u16()).collect();
        assert!(codes.contains(&100) && codes.contains(&101));
        assert!((200..=206).all(|c| codes.contains(&c)));
        assert!((300..=305).all(|c| codes.contains(&c)));
        assert!(!codes.contains(&306));
        assert!(codes.contains(&307));
        assert!((400..=417).all(|c| codes.contains(&c)));
        assert!((500..=505).all(|c| codes.contains(&c)));
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(lookup(306), Err(StatusError::Unknown(306)));
        assert_eq!(lookup(418), Err(StatusError::Unknown(418)));
        assert_eq!(lookup(0), Err(StatusError::Unknown(0)));
        assert!(StatusCode::from_u16(600).is_err());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(
            lookup(403),
            Ok(("Forbidden", "Request forbidden -- authorization will not help"))
        );
        assert_eq!(
            lookup(304),
            Ok(("Not Modified", "Document has not changed since given time"))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::RequestUriTooLong.to_string(), "414 Request-URI Too Long");
    }
}
