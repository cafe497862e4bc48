//! # Módulo de Errores
//!
//! Tipos de error del simulador. Todos los fallos son locales a un
//! trabajador o a una naranja y nunca corrompen el estado de otro trabajador.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::orange::State;
use crate::plant::PlantState;

/// Alias de `Result` para las operaciones del simulador.
pub type Result<T> = std::result::Result<T, PlantError>;

/// Errores que puede producir el simulador.
#[derive(Error, Debug)]
pub enum PlantError {
    /// Se intentó avanzar una naranja que ya está en su etapa final.
    ///
    /// Es un error de programación: la planta deja de avanzar naranjas al
    /// llegar a `Bottled`, así que nunca debería aparecer en operación normal.
    #[error("invalid transition: orange already in final state {state}")]
    InvalidTransition { state: State },

    /// `start` fue llamado sobre una planta que ya arrancó.
    #[error("plant {plant} already started (state: {state})")]
    AlreadyStarted { plant: usize, state: PlantState },

    /// `stop` o `wait` fueron llamados antes de `start`.
    #[error("plant {plant} has not been started")]
    NotStarted { plant: usize },

    /// El sistema operativo no pudo crear el hilo de un trabajador.
    #[error("failed to spawn worker {worker}")]
    Spawn {
        worker: String,
        #[source]
        source: io::Error,
    },

    /// `wait_timeout` venció con trabajadores todavía activos.
    #[error("plant {plant} still has running workers after {timeout:?}")]
    WaitTimeout { plant: usize, timeout: Duration },

    /// No se pudo inicializar el subscriber de tracing.
    #[error("logging error: {message}")]
    Logging { message: String },

    /// Parámetros de simulación inválidos.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl PlantError {
    /// Categoría corta y estable del error, usada para elegir el código de salida.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "transition",
            Self::AlreadyStarted { .. } | Self::NotStarted { .. } => "lifecycle",
            Self::Spawn { .. } => "threading",
            Self::WaitTimeout { .. } => "timeout",
            Self::Logging { .. } => "logging",
            Self::InvalidConfig { .. } => "config",
        }
    }
}
