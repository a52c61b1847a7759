//! # Errores del servidor
//! src/error.rs
//!
//! Los errores de parsing y de la tabla de estados viven junto a su módulo
//! (`http::parser::ParseError`, `http::status::StatusError`). Aquí quedan los
//! del arranque: configuración y socket de escucha.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errores al cargar o validar la configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Argumentos de línea de comandos inválidos (o `--help` / `--version`)
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// El archivo de configuración no se pudo leer o no tiene el formato esperado
    #[error("failed to load settings file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        source: ::config::ConfigError,
    },

    /// Algún valor está fuera de rango
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errores al arrancar el servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to create document root {}: {source}", .path.display())]
    Root { path: PathBuf, source: io::Error },

    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },
}
