//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración con soporte para argumentos CLI, variables de entorno y un
//! archivo `.ini` opcional.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./docserve --port 8080 --root ./www --max-connect 32 --default index.html,home.html
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! DOCSERVE_PORT=8080 DOCSERVE_ROOT=/srv/www ./docserve
//! ```
//!
//! ### Archivo de configuración
//! ```ini
//! [server]
//! max_connect = 32
//! root = ./www
//! port = 8080
//! recv_buf_size = 1024
//! default = index.html,index.htm
//! ```
//!
//! Prioridad: CLI o entorno > archivo > valor por defecto.

use crate::error::ConfigError;
use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches, Parser};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Configuración del servidor HTTP
#[derive(Debug, Clone, Parser)]
#[command(name = "docserve")]
#[command(about = "Servidor HTTP/1.1 concurrente de documentos estáticos")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Archivo .ini con una sección [server]
    #[arg(short = 'c', long = "config", env = "DOCSERVE_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "DOCSERVE_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "DOCSERVE_PORT")]
    pub port: u16,

    /// Directorio raíz de los documentos (se crea si no existe)
    #[arg(long, default_value = "./www", env = "DOCSERVE_ROOT")]
    pub root: PathBuf,

    /// Máximo de conexiones atendidas a la vez
    #[arg(long = "max-connect", default_value = "64", env = "DOCSERVE_MAX_CONNECT")]
    pub max_connect: usize,

    /// Tamaño de cada lectura del socket, en bytes
    #[arg(long = "recv-buf-size", default_value = "1024", env = "DOCSERVE_RECV_BUF_SIZE")]
    pub recv_buf_size: usize,

    /// Páginas probadas, en orden, cuando se pide un directorio
    #[arg(
        long = "default",
        value_delimiter = ',',
        default_values = ["index.html", "index.htm"],
        env = "DOCSERVE_DEFAULT"
    )]
    pub default_pages: Vec<String>,

    // === Timeouts ===
    /// Máximo de espera por cada lectura del socket, en milisegundos
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "DOCSERVE_READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Máximo para recibir el request completo, en milisegundos
    #[arg(
        long = "request-timeout-ms",
        default_value = "30000",
        env = "DOCSERVE_REQUEST_TIMEOUT_MS"
    )]
    pub request_timeout_ms: u64,

    /// Máximo de espera por cada escritura al socket, en milisegundos
    #[arg(long = "write-timeout-ms", default_value = "30000", env = "DOCSERVE_WRITE_TIMEOUT_MS")]
    pub write_timeout_ms: u64,

    /// Máximo de bytes para la request line + headers
    #[arg(long = "max-head-bytes", default_value = "8192", env = "DOCSERVE_MAX_HEAD_BYTES")]
    pub max_head_bytes: usize,

    /// Máximo Content-Length aceptado
    #[arg(long = "max-body-bytes", default_value = "1048576", env = "DOCSERVE_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// Filtro de logging (ej: "info", "docserve=debug"); RUST_LOG tiene prioridad
    #[arg(long = "log-level", default_value = "info", env = "DOCSERVE_LOG")]
    pub log_level: String,
}

/// Contenido del archivo .ini
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    #[serde(default)]
    server: ServerSection,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    max_connect: Option<usize>,
    root: Option<PathBuf>,
    port: Option<u16>,
    recv_buf_size: Option<usize>,
    default: Option<String>,
}

/// Separa una lista de páginas por saltos de línea o comas
fn split_pages(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Lee la configuración de CLI + entorno y, si se indicó, del archivo .ini
    ///
    /// Los valores del archivo solo reemplazan a los que quedaron por defecto.
    pub fn load() -> Result<Self, ConfigError> {
        let matches = Config::command().try_get_matches()?;
        let mut config = Config::from_arg_matches(&matches)?;

        if let Some(path) = config.config_file.clone() {
            config.merge_file(&path, |id| {
                !matches!(
                    matches.value_source(id),
                    Some(ValueSource::CommandLine | ValueSource::EnvVariable)
                )
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Aplica la sección `[server]` de un archivo .ini
    ///
    /// `overridable` recibe el nombre del campo y decide si el archivo puede
    /// reemplazarlo.
    pub fn merge_file(
        &mut self,
        path: &Path,
        overridable: impl Fn(&str) -> bool,
    ) -> Result<(), ConfigError> {
        let settings: FileSettings = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Ini))
            .build()
            .and_then(|raw| raw.try_deserialize())
            .map_err(|source| ConfigError::File {
                path: path.to_path_buf(),
                source,
            })?;
        let server = settings.server;

        if let Some(max_connect) = server.max_connect.filter(|_| overridable("max_connect")) {
            self.max_connect = max_connect;
        }
        if let Some(root) = server.root.filter(|_| overridable("root")) {
            self.root = root;
        }
        if let Some(port) = server.port.filter(|_| overridable("port")) {
            self.port = port;
        }
        if let Some(size) = server.recv_buf_size.filter(|_| overridable("recv_buf_size")) {
            self.recv_buf_size = size;
        }
        if let Some(pages) = server.default.filter(|_| overridable("default_pages")) {
            self.default_pages = split_pages(&pages);
        }

        Ok(())
    }

    /// Obtiene la dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::Invalid(message.to_string()));

        if self.max_connect == 0 {
            return invalid("max_connect must be >= 1");
        }
        if self.recv_buf_size == 0 {
            return invalid("recv_buf_size must be >= 1");
        }
        if self.default_pages.is_empty() {
            return invalid("at least one default page is required");
        }
        if self.read_timeout_ms == 0 {
            return invalid("read timeout must be > 0");
        }
        if self.request_timeout_ms == 0 {
            return invalid("request timeout must be > 0");
        }
        if self.write_timeout_ms == 0 {
            return invalid("write timeout must be > 0");
        }
        if self.max_head_bytes == 0 {
            return invalid("max_head_bytes must be >= 1");
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        info!(
            address = %self.address(),
            root = %self.root.display(),
            max_connect = self.max_connect,
            recv_buf_size = self.recv_buf_size,
            default_pages = ?self.default_pages,
            read_timeout_ms = self.read_timeout_ms,
            request_timeout_ms = self.request_timeout_ms,
            write_timeout_ms = self.write_timeout_ms,
            max_head_bytes = self.max_head_bytes,
            max_body_bytes = self.max_body_bytes,
            "configuration"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            config_file: None,
            host: "127.0.0.1".to_string(),
            port: 8080,
            root: PathBuf::from("./www"),
            max_connect: 64,
            recv_buf_size: 1024,
            default_pages: vec!["index.html".to_string(), "index.htm".to_string()],
            read_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
            max_head_bytes: 8192,
            max_body_bytes: 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}
