//! # Simulador de Plantas de Jugo
//!
//! Esta biblioteca simula varias plantas independientes que convierten
//! naranjas en botellas de jugo. Cada planta ejecuta varios trabajadores en
//! paralelo; cada trabajador toma una naranja, la lleva por todas sus etapas
//! y actualiza los contadores compartidos de la planta.
//!
//! ## Características principales
//!
//! - **Hilos reales**: cada trabajador es un hilo del sistema operativo
//!   (`std::thread::Builder`) con nombre `Plant[N] Worker[M]`.
//! - **Sincronización**: los contadores de la planta viven en un `Mutex`
//!   propio de cada planta y la bandera de trabajo es un `AtomicBool`.
//! - **Parada cooperativa**: `stop` baja la bandera y cada trabajador termina
//!   la naranja que tiene en la mano antes de salir.
//! - **Métricas**: naranjas provistas, procesadas, botellas y desperdicio.
//!
//! ## Estructura del proyecto
//!
//! - `orange`: etapas de una naranja y su avance temporizado
//! - `pace`: ritmo de procesamiento (real o instantáneo)
//! - `plant`: la planta con su grupo de trabajadores
//! - `metrics`: resúmenes por planta y totales
//! - `simulation`: orquestador que arranca, espera y detiene las plantas
//! - `error`: tipos de error
//! - `logging`: inicialización de tracing

pub mod error;
pub mod logging;
pub mod metrics;
pub mod orange;
pub mod pace;
pub mod plant;
pub mod simulation;

// Re-exportar las estructuras principales para facilitar su uso
pub use error::{PlantError, Result};
pub use metrics::{MetricsCalculator, PlantSnapshot, ProductionSummary};
pub use orange::{InterruptFlag, Orange, State};
pub use pace::Pace;
pub use plant::{bottles_for, waste_for, Plant, PlantState, WorkerReport};
pub use simulation::{Simulation, SimulationConfig};

/// Configuración fija del simulador
pub mod config {
    use std::time::Duration;

    /// Duración de la etapa `Fetched` (ms)
    pub const FETCHED_MS: u64 = 15;
    /// Duración de la etapa `Peeled` (ms)
    pub const PEELED_MS: u64 = 38;
    /// Duración de la etapa `Squeezed` (ms)
    pub const SQUEEZED_MS: u64 = 29;
    /// Duración de la etapa `Bottled` (ms)
    pub const BOTTLED_MS: u64 = 17;
    /// Duración de la etapa `Processed` (ms)
    pub const PROCESSED_MS: u64 = 1;

    /// Naranjas necesarias para llenar una botella
    pub const ORANGES_PER_BOTTLE: u64 = 3;

    /// Número de plantas por defecto
    pub const NUM_PLANTS: usize = 2;

    /// Trabajadores por planta por defecto
    pub const PLANT_THREADS: usize = 3;

    /// Intervalo de sondeo de `Plant::wait_timeout`
    pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

    /// Tiempo que se deja trabajar a las plantas por defecto
    pub fn processing_time() -> Duration {
        Duration::from_secs(5)
    }
}
