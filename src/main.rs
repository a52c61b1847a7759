//! # docserve - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor: lee la configuración, instala el logging
//! y se queda aceptando conexiones.

use docserve::config::Config;
use docserve::error::ConfigError;
use docserve::server::Server;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// RUST_LOG tiene prioridad sobre `--log-level`
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .init();
}

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(ConfigError::Cli(err)) => err.exit(),
        Err(err) => {
            eprintln!("💥 Error de configuración: {}", err);
            std::process::exit(2);
        }
    };

    init_tracing(&config.log_level);
    config.log_summary();

    let server = match Server::new(config) {
        Ok(server) => server,
        Err(err) => {
            error!(error = %err, "failed to start server");
            std::process::exit(1);
        }
    };

    // Bloquea el thread principal aceptando conexiones
    server.run()
}
