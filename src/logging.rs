//! # Módulo de Logging
//!
//! Inicialización del subscriber de `tracing`. La biblioteca solo emite
//! eventos; instalar el subscriber le corresponde al binario.

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{PlantError, Result};

/// Configuración del logging.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Nivel por defecto cuando `RUST_LOG` no está definido
    pub level: Level,
    /// Mostrar el módulo que emitió cada evento
    pub include_target: bool,
    /// Mostrar el nombre del hilo (`Plant[N] Worker[M]`)
    pub include_thread_names: bool,
    /// Colores ANSI
    pub colored: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            include_target: false,
            include_thread_names: true,
            colored: true,
        }
    }
}

/// Construye el filtro: `RUST_LOG` si existe, si no el nivel configurado.
pub fn build_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Instala el subscriber global escribiendo a stderr.
///
/// # Errors
///
/// `PlantError::Logging` si ya había un subscriber global instalado.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    fmt()
        .with_env_filter(build_filter(config.level))
        .with_target(config.include_target)
        .with_thread_names(config.include_thread_names)
        .with_ansi(config.colored)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| PlantError::Logging {
            message: format!("failed to initialize logging: {}", e),
        })?;

    tracing::debug!("logging inicializado");
    Ok(())
}

/// Nivel según las banderas `-q` / `-v` de la línea de comandos.
pub fn level_from_verbosity(quiet: bool, verbose: u8) -> Level {
    if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
