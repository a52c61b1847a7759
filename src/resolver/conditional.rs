//! # GET condicional
//! src/resolver/conditional.rs
//!
//! Fechas HTTP (`Fri, 23 Oct 2009 08:06:04 GMT`) y la comparación contra la
//! fecha de modificación de un archivo.
//!
//! El valor que se compara es el header `Last-Modified` **del request**, no
//! `If-Modified-Since`. Los clientes de este servidor devuelven el
//! `Last-Modified` que recibieron en la respuesta anterior.

use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Parsea una fecha HTTP con formato `%a, %d %b %Y %H:%M:%S GMT`
///
/// Retorna `None` si el texto no tiene ese formato.
pub fn parse_http_date(value: &str) -> Option<OffsetDateTime> {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    PrimitiveDateTime::parse(value.trim(), format)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Formatea una fecha como fecha HTTP en GMT
pub fn format_http_date(moment: OffsetDateTime) -> Result<String, time::error::Format> {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    moment.to_offset(UtcOffset::UTC).format(format)
}

/// `true` si el cliente trae una fecha estrictamente posterior a la del archivo
///
/// Un header ausente o ilegible nunca produce 304.
pub fn is_not_modified(last_modified: Option<&str>, file_modified: OffsetDateTime) -> bool {
    last_modified
        .and_then(parse_http_date)
        .is_some_and(|client| client > file_modified)
}
