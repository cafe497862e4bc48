//! # Módulo de Naranjas
//!
//! Una naranja es la unidad que atraviesa la planta. Recorre una secuencia
//! fija de etapas y cada etapa cuesta un tiempo determinado. No tiene
//! concurrencia propia: pertenece exclusivamente al trabajador que la procesa.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::config;
use crate::error::{PlantError, Result};
use crate::pace::Pace;

/// Etapas por las que pasa una naranja, en orden estricto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Recién traída a la planta (15 ms).
    Fetched,
    /// Pelada (38 ms).
    Peeled,
    /// Exprimida (29 ms).
    Squeezed,
    /// Embotellada (17 ms). Marca la naranja como lista para contabilizar.
    Bottled,
    /// Etapa final (1 ms).
    Processed,
}

impl State {
    /// Todas las etapas en orden de procesamiento.
    pub const ALL: [State; 5] = [
        State::Fetched,
        State::Peeled,
        State::Squeezed,
        State::Bottled,
        State::Processed,
    ];

    /// Tiempo fijo que cuesta completar la etapa.
    pub fn time_to_complete(self) -> Duration {
        let millis = match self {
            Self::Fetched => config::FETCHED_MS,
            Self::Peeled => config::PEELED_MS,
            Self::Squeezed => config::SQUEEZED_MS,
            Self::Bottled => config::BOTTLED_MS,
            Self::Processed => config::PROCESSED_MS,
        };
        Duration::from_millis(millis)
    }

    /// Obtiene la etapa inmediatamente siguiente.
    ///
    /// # Returns
    ///
    /// La siguiente etapa, o `PlantError::InvalidTransition` si esta ya es la final
    ///
    /// # Examples
    ///
    /// ```rust
    /// use juice_plant_simulator::State;
    ///
    /// assert_eq!(State::Squeezed.next().unwrap(), State::Bottled);
    /// assert!(State::Processed.next().is_err());
    /// ```
    pub fn next(self) -> Result<State> {
        match self {
            Self::Fetched => Ok(Self::Peeled),
            Self::Peeled => Ok(Self::Squeezed),
            Self::Squeezed => Ok(Self::Bottled),
            Self::Bottled => Ok(Self::Processed),
            Self::Processed => Err(PlantError::InvalidTransition { state: self }),
        }
    }

    /// Indica si es la etapa terminal.
    pub fn is_final(self) -> bool {
        self == Self::Processed
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetched => "Fetched",
            Self::Peeled => "Peeled",
            Self::Squeezed => "Squeezed",
            Self::Bottled => "Bottled",
            Self::Processed => "Processed",
        };
        f.write_str(name)
    }
}

/// Señal de interrupción de un trabajador.
///
/// Equivale al estado "interrumpido" de un hilo: `raise` la deja activa y la
/// espera de la etapa en curso la consume y termina antes de tiempo. Un
/// despertar de `park_timeout` sin la señal activa no acorta la etapa.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlag {
    raised: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// Crea una señal sin activar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Activa la señal. El hilo dueño debe despertarse con `Thread::unpark`.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Indica si la señal está activa, sin consumirla.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Consume la señal. `true` si estaba activa.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }
}

/// Una naranja en proceso.
///
/// Se crea en la etapa `Fetched` y el trabajo de esa etapa se ejecuta
/// antes de que el constructor retorne, así que nunca se observa una naranja
/// "sin empezar". Avanza de forma monótona, sin saltos ni retrocesos.
#[derive(Debug)]
pub struct Orange {
    state: State,
    pace: Pace,
    interrupt: Option<InterruptFlag>,
}

impl Orange {
    /// Crea una naranja con las demoras reales de cada etapa.
    ///
    /// Bloquea al hilo actual mientras dura la etapa `Fetched`.
    pub fn new() -> Self {
        Self::with_pace(Pace::Realtime)
    }

    /// Crea una naranja con el ritmo indicado.
    ///
    /// # Arguments
    ///
    /// * `pace` - Ritmo con el que se simula el trabajo de cada etapa
    ///
    /// # Examples
    ///
    /// ```rust
    /// use juice_plant_simulator::{Orange, Pace, State};
    ///
    /// let orange = Orange::with_pace(Pace::Instant);
    /// assert_eq!(orange.state(), State::Fetched);
    /// ```
    pub fn with_pace(pace: Pace) -> Self {
        Self::start(pace, None)
    }

    /// Crea una naranja cuyo trabajo puede cortarse con una `InterruptFlag`.
    ///
    /// # Arguments
    ///
    /// * `pace` - Ritmo con el que se simula el trabajo de cada etapa
    /// * `interrupt` - Señal del trabajador que procesa la naranja
    pub fn interruptible(pace: Pace, interrupt: InterruptFlag) -> Self {
        Self::start(pace, Some(interrupt))
    }

    fn start(pace: Pace, interrupt: Option<InterruptFlag>) -> Self {
        let orange = Self {
            state: State::Fetched,
            pace,
            interrupt,
        };
        orange.do_work();
        orange
    }

    /// Etapa actual de la naranja.
    pub fn state(&self) -> State {
        self.state
    }

    /// Ritmo con el que se procesa esta naranja.
    pub fn pace(&self) -> Pace {
        self.pace
    }

    /// Ejecuta el trabajo de la etapa actual y pasa a la siguiente.
    ///
    /// # Returns
    ///
    /// La nueva etapa de la naranja
    ///
    /// # Errors
    ///
    /// `PlantError::InvalidTransition` si la naranja ya estaba en `Processed`.
    /// En ese caso no se ejecuta ningún trabajo.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use juice_plant_simulator::{Orange, Pace, State};
    ///
    /// let mut orange = Orange::with_pace(Pace::Instant);
    /// assert_eq!(orange.run_process().unwrap(), State::Peeled);
    /// ```
    pub fn run_process(&mut self) -> Result<State> {
        if self.state.is_final() {
            return Err(PlantError::InvalidTransition { state: self.state });
        }
        self.do_work();
        self.state = self.state.next()?;
        trace!(state = %self.state, "naranja avanzó de etapa");
        Ok(self.state)
    }

    /// Simula el trabajo de la etapa actual.
    ///
    /// Duerme con `park_timeout` hasta cumplir el plazo completo. Solo una
    /// `InterruptFlag` activa corta la espera, y eso genera una advertencia;
    /// la naranja igual avanza de etapa.
    fn do_work(&self) {
        let work = self.pace.work_for(self.state);
        if work.is_zero() {
            return;
        }

        let deadline = Instant::now() + work;
        loop {
            if self.interrupt.as_ref().is_some_and(InterruptFlag::take) {
                warn!(
                    state = %self.state,
                    "procesamiento de naranja incompleto, el jugo puede salir malo"
                );
                return;
            }

            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

impl Default for Orange {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_in_first_state() {
        let orange = Orange::with_pace(Pace::Instant);
        assert_eq!(orange.state(), State::Fetched);
        assert_eq!(orange.pace(), Pace::Instant);
    }

    #[test]
    fn test_visits_every_state_in_order() {
        let mut orange = Orange::with_pace(Pace::Instant);
        let mut visited = vec![orange.state()];
        while !orange.state().is_final() {
            visited.push(orange.run_process().unwrap());
        }
        assert_eq!(visited, State::ALL.to_vec());
    }

    #[test]
    fn test_advance_past_final_fails() {
        let mut orange = Orange::with_pace(Pace::Instant);
        for _ in 0..4 {
            orange.run_process().unwrap();
        }
        assert_eq!(orange.state(), State::Processed);

        let err = orange.run_process().unwrap_err();
        assert!(matches!(
            err,
            PlantError::InvalidTransition {
                state: State::Processed
            }
        ));
        // El error no modifica la naranja
        assert_eq!(orange.state(), State::Processed);
        assert!(orange.run_process().is_err());
    }

    #[test]
    fn test_stage_durations() {
        let millis: Vec<u128> = State::ALL
            .iter()
            .map(|s| s.time_to_complete().as_millis())
            .collect();
        assert_eq!(millis, vec![15, 38, 29, 17, 1]);
    }

    #[test]
    fn test_states_are_ordered() {
        for pair in State::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].next().unwrap(), pair[1]);
        }
        assert!(State::Processed.next().is_err());
    }

    #[test]
    fn test_realtime_orange_advances() {
        let mut orange = Orange::new();
        assert_eq!(orange.pace(), Pace::Realtime);
        orange.run_process().unwrap();
        assert_eq!(orange.state(), State::Peeled);
    }

    #[test]
    fn test_interrupted_work_still_transitions() {
        let interrupt = InterruptFlag::new();
        let mut orange = Orange::interruptible(Pace::Realtime, interrupt.clone());

        interrupt.raise();
        thread::current().unpark();
        assert_eq!(orange.run_process().unwrap(), State::Peeled);
        // La espera consumió la señal
        assert!(!interrupt.is_raised());
        assert_eq!(orange.run_process().unwrap(), State::Squeezed);
    }

    #[test]
    fn test_unpark_without_interrupt_keeps_full_stage() {
        let mut orange = Orange::interruptible(Pace::Realtime, InterruptFlag::new());

        // Un token de unpark pendiente sin señal no acorta la etapa
        thread::current().unpark();
        let started = Instant::now();
        orange.run_process().unwrap();
        assert!(started.elapsed() >= State::Fetched.time_to_complete());
        assert_eq!(orange.state(), State::Peeled);
    }

    #[test]
    fn test_interrupt_flag_take() {
        let flag = InterruptFlag::new();
        assert!(!flag.take());
        flag.raise();
        assert!(flag.clone().is_raised());
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", State::Bottled), "Bottled");
        assert_eq!(State::Squeezed.to_string(), "Squeezed");
    }
}
