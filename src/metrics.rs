//! # Módulo de Métricas y Reportes
//!
//! Este módulo agrega los contadores de varias plantas y genera el reporte
//! final de la simulación.

use std::time::Duration;

use crate::plant::Plant;

/// Contadores de una planta en un momento dado.
///
/// Solo son estables si se tomaron después de que `Plant::wait` retornó.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlantSnapshot {
    /// ID de la planta
    pub plant_id: usize,
    /// Naranjas tomadas por los trabajadores
    pub provided: u64,
    /// Naranjas llevadas hasta `Bottled`
    pub processed: u64,
    /// Botellas completas
    pub bottles: u64,
    /// Naranjas procesadas que sobraron
    pub waste: u64,
}

/// Totales de producción de toda la simulación.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductionSummary {
    /// Foto de cada planta, en el orden en que se agregaron
    pub plants: Vec<PlantSnapshot>,
    /// Total de naranjas provistas
    pub total_provided: u64,
    /// Total de naranjas procesadas
    pub total_processed: u64,
    /// Total de botellas
    pub total_bottles: u64,
    /// Total de naranjas desperdiciadas
    pub total_wasted: u64,
    /// Tiempo total que duró la simulación
    pub elapsed: Duration,
}

impl ProductionSummary {
    /// Suma los contadores de varias plantas.
    ///
    /// Las botellas y el desperdicio se suman planta por planta: las sobras
    /// de una planta no completan botellas de otra.
    ///
    /// # Arguments
    ///
    /// * `plants` - Fotos de cada planta
    /// * `elapsed` - Duración total de la simulación
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use juice_plant_simulator::{PlantSnapshot, ProductionSummary};
    ///
    /// let a = PlantSnapshot { plant_id: 1, provided: 10, processed: 10, bottles: 3, waste: 1 };
    /// let b = PlantSnapshot { plant_id: 2, provided: 8, processed: 8, bottles: 2, waste: 2 };
    /// let summary = ProductionSummary::from_snapshots(vec![a, b], Duration::ZERO);
    /// assert_eq!(summary.total_bottles, 5);
    /// assert_eq!(summary.total_wasted, 3);
    /// ```
    pub fn from_snapshots(plants: Vec<PlantSnapshot>, elapsed: Duration) -> Self {
        let mut summary = Self {
            elapsed,
            ..Self::default()
        };
        for plant in &plants {
            summary.total_provided += plant.provided;
            summary.total_processed += plant.processed;
            summary.total_bottles += plant.bottles;
            summary.total_wasted += plant.waste;
        }
        summary.plants = plants;
        summary
    }

    /// Toma la foto de cada planta y las suma.
    pub fn from_plants(plants: &[Plant], elapsed: Duration) -> Self {
        Self::from_snapshots(plants.iter().map(Plant::snapshot).collect(), elapsed)
    }

    /// Genera el reporte de texto: una línea por planta y las dos líneas de totales.
    pub fn report(&self) -> String {
        let mut report = String::new();

        for plant in &self.plants {
            report.push_str(&format!(
                "Plant[{}]: provided/processed = {}/{}, bottles {}, waste {}\n",
                plant.plant_id, plant.provided, plant.processed, plant.bottles, plant.waste
            ));
        }

        report.push_str(&format!(
            "Total provided/processed = {}/{}\n",
            self.total_provided, self.total_processed
        ));
        report.push_str(&format!(
            "Created {}, wasted {} oranges\n",
            self.total_bottles, self.total_wasted
        ));

        report
    }
}

/// Utilidades de cálculo y formato para los reportes.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Formatea una duración como "segundos.milisegundos".
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use juice_plant_simulator::MetricsCalculator;
    ///
    /// assert_eq!(MetricsCalculator::format_duration(Duration::from_millis(1500)), "1.500s");
    /// ```
    pub fn format_duration(duration: Duration) -> String {
        let millis = duration.as_millis();
        let seconds = millis / 1000;
        let milliseconds = millis % 1000;
        format!("{}.{:03}s", seconds, milliseconds)
    }
}
