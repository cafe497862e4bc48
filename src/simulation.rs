//! # Módulo de Simulación Principal
//!
//! Orquesta una corrida completa: crea las plantas, las arranca, las deja
//! trabajar durante un intervalo fijo, las detiene, espera a que terminen
//! y suma sus contadores.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config;
use crate::error::{PlantError, Result};
use crate::metrics::{MetricsCalculator, ProductionSummary};
use crate::pace::Pace;
use crate::plant::Plant;

/// Parámetros de una corrida.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Número de plantas independientes
    pub plant_count: usize,
    /// Trabajadores por planta
    pub workers_per_plant: usize,
    /// Tiempo que se deja trabajar a las plantas
    pub processing_time: Duration,
    /// Ritmo de las etapas
    pub pace: Pace,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            plant_count: config::NUM_PLANTS,
            workers_per_plant: config::PLANT_THREADS,
            processing_time: config::processing_time(),
            pace: Pace::Realtime,
        }
    }
}

impl SimulationConfig {
    /// Verifica que la configuración tenga sentido.
    pub fn validate(&self) -> Result<()> {
        if self.plant_count == 0 {
            return Err(PlantError::InvalidConfig {
                message: "se necesita al menos una planta".to_string(),
            });
        }
        if self.workers_per_plant == 0 {
            return Err(PlantError::InvalidConfig {
                message: "cada planta necesita al menos un trabajador".to_string(),
            });
        }
        Ok(())
    }
}

/// Orquestador de la simulación.
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    /// Crea una simulación con la configuración indicada.
    ///
    /// # Errors
    ///
    /// `PlantError::InvalidConfig` si no hay plantas o trabajadores.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use juice_plant_simulator::{Pace, Simulation, SimulationConfig};
    ///
    /// let config = SimulationConfig {
    ///     plant_count: 2,
    ///     workers_per_plant: 2,
    ///     processing_time: Duration::from_millis(10),
    ///     pace: Pace::Instant,
    /// };
    /// let summary = Simulation::new(config).unwrap().run().unwrap();
    /// assert_eq!(summary.plants.len(), 2);
    /// ```
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Ejecuta la corrida completa y retorna los totales.
    ///
    /// Si una planta no puede arrancar, las que ya arrancaron se detienen y
    /// se esperan antes de devolver el error.
    pub fn run(&self) -> Result<ProductionSummary> {
        info!(
            plants = self.config.plant_count,
            workers_per_plant = self.config.workers_per_plant,
            processing_time = %MetricsCalculator::format_duration(self.config.processing_time),
            pace = %self.config.pace,
            "iniciando simulación de jugo"
        );

        let started = Instant::now();
        let plants: Vec<Plant> = (1..=self.config.plant_count)
            .map(|id| Plant::with_pace(id, self.config.workers_per_plant, self.config.pace))
            .collect();

        for (index, plant) in plants.iter().enumerate() {
            if let Err(err) = plant.start() {
                Self::shutdown(&plants[..index]);
                return Err(err);
            }
        }

        // Dar tiempo a las plantas para trabajar
        thread::sleep(self.config.processing_time);

        Self::shutdown(&plants);

        let summary = ProductionSummary::from_plants(&plants, started.elapsed());
        info!(
            provided = summary.total_provided,
            processed = summary.total_processed,
            bottles = summary.total_bottles,
            wasted = summary.total_wasted,
            elapsed = %MetricsCalculator::format_duration(summary.elapsed),
            "simulación completada"
        );
        Ok(summary)
    }

    /// Detiene todas las plantas y luego espera a cada una.
    fn shutdown(plants: &[Plant]) {
        for plant in plants {
            if let Err(err) = plant.stop() {
                warn!(plant = plant.id(), error = %err, "la planta no se detuvo limpiamente");
            }
        }
        for plant in plants {
            if let Err(err) = plant.wait() {
                warn!(plant = plant.id(), error = %err, "la planta no terminó limpiamente");
            }
        }
    }
}
