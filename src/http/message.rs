//! # Forma común de los mensajes HTTP
//! src/http/message.rs
//!
//! Request y Response comparten la misma forma: headers, versión del
//! protocolo y un body de bytes. Cada uno guarda sus headers como le conviene
//! (el request en un `HashMap`, la response en orden de inserción), así que el
//! trait solo expone las lecturas.

/// Lectura de las partes compartidas por todo mensaje HTTP
pub trait HttpMessage {
    /// Versión del protocolo, tal como viene en la línea inicial (ej: "HTTP/1.1")
    fn version(&self) -> &str;

    /// Valor de un header. La búsqueda distingue mayúsculas de minúsculas.
    fn header(&self, name: &str) -> Option<&str>;

    /// Body crudo del mensaje
    fn body(&self) -> &[u8];
}
