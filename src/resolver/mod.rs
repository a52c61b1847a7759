//! # Resolución de recursos estáticos
//! src/resolver/mod.rs
//!
//! Mapea el path de un request a un archivo bajo el directorio raíz y
//! construye la respuesta:
//!
//! ```text
//! Request → root + path → ¿directorio? → páginas por defecto → ¿archivo?
//!                                                              │
//!                        404 ◄── no ─────────────────────────────┤
//!                        304 ◄── Last-Modified más nuevo ◄── sí ─┤
//!                        200 ◄── contenido del archivo           │
//!                        403 ◄── error de lectura ───────────────┘
//! ```

pub mod conditional;

use crate::http::{HttpMessage, Request, Response, StatusCode};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Resuelve requests contra un directorio raíz
#[derive(Debug, Clone)]
pub struct Resolver {
    /// Directorio raíz de los documentos
    root: PathBuf,

    /// Nombres probados, en orden, cuando el path es un directorio
    default_pages: Vec<String>,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>, default_pages: Vec<String>) -> Self {
        Self {
            root: root.into(),
            default_pages,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn default_pages(&self) -> &[String] {
        &self.default_pages
    }

    /// Construye la respuesta para un request
    ///
    /// Nunca falla: los errores de recursos se convierten en 403/404. La
    /// versión de la respuesta es la del request.
    pub fn resolve(&self, request: &Request) -> Response {
        let version = request.version();

        let Some(candidate) = self.candidate(request.path()) else {
            debug!(path = request.path(), "path escapes the document root");
            return Response::new(version, StatusCode::Forbidden);
        };
        let target = self.with_default_page(candidate);

        if !target.is_file() {
            debug!(target = %target.display(), "no such file");
            return Response::new(version, StatusCode::NotFound);
        }

        match self.serve_file(&target, request) {
            Ok(response) => response,
            Err(err) => {
                warn!(target = %target.display(), error = %err, "failed to read file");
                Response::new(version, StatusCode::Forbidden)
            }
        }
    }

    /// `root + path`, o `None` si el path sube con `..`
    fn candidate(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });

        if escapes {
            None
        } else {
            Some(self.root.join(relative))
        }
    }

    /// Si `candidate` es un directorio, el primer archivo por defecto que exista
    fn with_default_page(&self, candidate: PathBuf) -> PathBuf {
        if !candidate.is_dir() {
            return candidate;
        }

        self.default_pages
            .iter()
            .map(|page| candidate.join(page))
            .find(|path| path.is_file())
            .unwrap_or(candidate)
    }

    fn serve_file(&self, path: &Path, request: &Request) -> io::Result<Response> {
        let version = request.version();
        let mut file = File::open(path)?;
        let modified = OffsetDateTime::from(file.metadata()?.modified()?);

        if conditional::is_not_modified(request.header("Last-Modified"), modified) {
            debug!(target = %path.display(), "not modified");
            return Ok(Response::new(version, StatusCode::NotModified));
        }

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let mut response = Response::new(version, StatusCode::Ok);
        if let Ok(stamp) = conditional::format_http_date(modified) {
            response.add_header("Last-Modified", &stamp);
        }
        response.set_data(contents.into_bytes());
        Ok(response)
    }
}
