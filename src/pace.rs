//! # Módulo de Ritmo de Procesamiento
//!
//! Define cuánto tiempo real cuesta cada etapa de una naranja. Las duraciones
//! por etapa son constantes fijas; el ritmo solo decide si se respetan o si
//! el trabajo es instantáneo.

use std::fmt;
use std::time::Duration;

use crate::orange::State;

/// Ritmo con el que los trabajadores ejecutan las etapas.
///
/// - `Realtime` bloquea al trabajador el tiempo configurado de cada etapa.
/// - `Instant` no introduce ninguna demora; pensado para pruebas que cuentan
///   transiciones sin depender del reloj.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pace {
    /// Cada etapa cuesta su duración fija.
    #[default]
    Realtime,
    /// Cada etapa cuesta cero.
    Instant,
}

impl Pace {
    /// Calcula la demora que cuesta completar una etapa con este ritmo.
    ///
    /// # Arguments
    ///
    /// * `state` - Etapa cuyo trabajo se va a simular
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use juice_plant_simulator::{Pace, State};
    ///
    /// assert_eq!(Pace::Realtime.work_for(State::Peeled), Duration::from_millis(38));
    /// assert_eq!(Pace::Instant.work_for(State::Peeled), Duration::ZERO);
    /// ```
    pub fn work_for(&self, state: State) -> Duration {
        match self {
            Self::Realtime => state.time_to_complete(),
            Self::Instant => Duration::ZERO,
        }
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Realtime => write!(f, "realtime"),
            Self::Instant => write!(f, "instant"),
        }
    }
}
