//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Limita las conexiones simultáneas (`admission`)
//! 3. Atiende cada conexión en su propio thread (`tcp`)

pub mod admission;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use admission::{Admission, Permit};
pub use tcp::{handle_connection, ConnectionSettings, Server};
