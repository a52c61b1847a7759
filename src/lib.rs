//! # docserve
//! src/lib.rs
//!
//! Servidor HTTP/1.1 concurrente de documentos estáticos: un thread por
//! conexión, un request por conexión.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Tabla de estados, requests, responses y el parser incremental
//! - `resolver`: Mapeo de paths a archivos y GET condicional
//! - `server`: Control de admisión y manejo de conexiones TCP
//! - `config`: CLI, variables de entorno y archivo .ini
//!
//! ```text
//! accept ──► worker ──► RequestParser ──► Resolver ──► Response ──► socket
//!    ▲                                                                 │
//!    └────────────── Admission (lugar liberado al cerrar) ◄────────────┘
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use docserve::config::Config;
//! use docserve::server::Server;
//!
//! let config = Config::default();
//! let server = Server::new(config).expect("Error al iniciar servidor");
//! server.run();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod resolver;
pub mod server;
