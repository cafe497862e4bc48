//! Tests de integración para el simulador de plantas de jugo

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use proptest::prelude::*;

use juice_plant_simulator::{
    bottles_for, waste_for, Orange, Pace, Plant, PlantError, PlantState, ProductionSummary,
    Simulation, SimulationConfig, State,
};

/// Arranca una planta, la deja trabajar `window` y la detiene.
fn run_plant(plant: &Plant, window: Duration) {
    plant.start().unwrap();
    thread::sleep(window);
    plant.stop().unwrap();
    plant.wait().unwrap();
}

fn assert_no_lost_updates(workers: usize) {
    let plant = Plant::with_pace(1, workers, Pace::Instant);
    run_plant(&plant, Duration::from_millis(30));

    let reports = plant.worker_reports();
    assert_eq!(reports.len(), workers);

    // Cada trabajador cuenta localmente las naranjas que llevó a Bottled;
    // el contador compartido debe coincidir exactamente con la suma
    let bottled: u64 = reports.iter().map(|r| r.bottled).sum();
    assert_eq!(plant.processed_count(), bottled);

    let provided: u64 = reports.iter().map(|r| r.provided).sum();
    assert_eq!(plant.provided_count(), provided);
}

#[test]
fn test_no_lost_updates_single_worker() {
    assert_no_lost_updates(1);
}

#[test]
fn test_no_lost_updates_three_workers() {
    assert_no_lost_updates(3);
}

#[test]
fn test_no_lost_updates_eight_workers() {
    assert_no_lost_updates(8);
}

#[test]
fn test_processed_never_exceeds_provided() {
    let plant = Plant::with_pace(1, 3, Pace::Instant);
    run_plant(&plant, Duration::from_millis(20));
    assert!(plant.processed_count() <= plant.provided_count());
    assert!(plant.processed_count() > 0);
    assert_eq!(plant.bottle_count(), plant.processed_count() / 3);
    assert_eq!(plant.waste_count(), plant.processed_count() % 3);
}

#[test]
fn test_immediate_stop_realtime() {
    let plant = Plant::new(1, 3);
    plant.start().unwrap();
    plant.stop().unwrap();
    plant.wait().unwrap();

    // Puede que algún trabajador alcanzara a tomar una naranja antes de ver
    // la bandera abajo; en ese caso la termina completa
    assert!(plant.processed_count() <= plant.provided_count());
    assert!(plant.provided_count() <= 3);
    assert_eq!(plant.bottle_count(), bottles_for(plant.processed_count()));
    assert_eq!(plant.waste_count(), waste_for(plant.processed_count()));
    assert_eq!(plant.state(), PlantState::Stopped);
}

#[test]
fn test_in_flight_orange_completes_after_stop() {
    let plant = Plant::new(1, 2);
    run_plant(&plant, Duration::from_millis(150));

    // Una naranja tarda ~99 ms hasta Bottled; en 150 ms cada trabajador
    // terminó al menos una y ninguna quedó a medias
    assert!(plant.processed_count() >= 2);
    assert_eq!(plant.processed_count(), plant.provided_count());
}

#[test]
fn test_independent_plants() {
    let quiet = Plant::with_pace(1, 3, Pace::Instant);
    let busy = Plant::with_pace(2, 3, Pace::Instant);

    quiet.start().unwrap();
    quiet.stop().unwrap();
    quiet.wait().unwrap();
    let quiet_processed = quiet.processed_count();

    run_plant(&busy, Duration::from_millis(20));

    assert_eq!(quiet.processed_count(), quiet_processed);
    let busy_bottled: u64 = busy.worker_reports().iter().map(|r| r.bottled).sum();
    assert_eq!(busy.processed_count(), busy_bottled);
}

#[test]
fn test_concurrent_plants_do_not_interfere() {
    let plants: Vec<Plant> = (1..=2)
        .map(|id| Plant::with_pace(id, 3, Pace::Instant))
        .collect();

    for plant in &plants {
        plant.start().unwrap();
    }
    thread::sleep(Duration::from_millis(25));
    for plant in &plants {
        plant.stop().unwrap();
    }
    for plant in &plants {
        plant.wait().unwrap();
    }

    for plant in &plants {
        let bottled: u64 = plant.worker_reports().iter().map(|r| r.bottled).sum();
        assert_eq!(plant.processed_count(), bottled);
        for report in plant.worker_reports() {
            assert!(report.name.starts_with(&format!("Plant[{}]", plant.id())));
        }
    }

    let summary = ProductionSummary::from_plants(&plants, Duration::from_millis(25));
    assert_eq!(
        summary.total_processed,
        plants.iter().map(Plant::processed_count).sum::<u64>()
    );
}

#[test]
fn test_wait_blocks_until_stopped_elsewhere() {
    let plant = Arc::new(Plant::with_pace(1, 2, Pace::Instant));
    plant.start().unwrap();

    let waiter = {
        let plant = Arc::clone(&plant);
        thread::spawn(move || plant.wait())
    };

    thread::sleep(Duration::from_millis(20));
    assert_eq!(plant.state(), PlantState::Running);
    plant.stop().unwrap();

    waiter.join().unwrap().unwrap();
    assert_eq!(plant.state(), PlantState::Stopped);
}

#[test]
fn test_wait_timeout_expires_while_running() {
    let plant = Plant::with_pace(1, 2, Pace::Instant);
    plant.start().unwrap();

    let err = plant.wait_timeout(Duration::from_millis(10)).unwrap_err();
    assert!(matches!(err, PlantError::WaitTimeout { plant: 1, .. }));
    assert_eq!(plant.state(), PlantState::Running);

    plant.stop().unwrap();
    plant.wait_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(plant.state(), PlantState::Stopped);
    assert_eq!(plant.worker_reports().len(), 2);
}

#[test]
fn test_interrupt_does_not_abort_oranges() {
    let plant = Plant::new(1, 2);
    plant.start().unwrap();
    for _ in 0..5 {
        thread::sleep(Duration::from_millis(10));
        plant.interrupt();
    }
    plant.stop().unwrap();
    plant.wait().unwrap();

    // Las naranjas interrumpidas igual se terminan y se cuentan
    assert_eq!(plant.worker_reports().len(), 2);
    assert_eq!(plant.processed_count(), plant.provided_count());
}

#[test]
fn test_orange_full_sequence() {
    let mut orange = Orange::with_pace(Pace::Instant);
    let mut visited = vec![orange.state()];
    while let Ok(state) = orange.run_process() {
        visited.push(state);
    }
    assert_eq!(
        visited,
        vec![
            State::Fetched,
            State::Peeled,
            State::Squeezed,
            State::Bottled,
            State::Processed
        ]
    );
    assert!(matches!(
        orange.run_process(),
        Err(PlantError::InvalidTransition {
            state: State::Processed
        })
    ));
}

#[test]
fn test_simulation_end_to_end() {
    let config = SimulationConfig {
        plant_count: 2,
        workers_per_plant: 3,
        processing_time: Duration::from_millis(20),
        pace: Pace::Instant,
    };
    let summary = Simulation::new(config).unwrap().run().unwrap();

    assert_eq!(summary.plants.len(), 2);
    assert!(summary.total_processed <= summary.total_provided);
    assert_eq!(
        summary.total_bottles,
        summary.plants.iter().map(|p| p.processed / 3).sum::<u64>()
    );

    let report = summary.report();
    assert!(report.contains("Total provided/processed = "));
    assert!(report.contains("Created "));
    assert!(!report.contains("wasted -"));
}

proptest! {
    #[test]
    fn prop_bottles_and_waste_partition_processed(processed in 0u64..1_000_000_000) {
        let bottles = bottles_for(processed);
        let waste = waste_for(processed);
        prop_assert_eq!(bottles, processed / 3);
        prop_assert_eq!(waste, processed % 3);
        prop_assert!(waste < 3);
        prop_assert_eq!(bottles * 3 + waste, processed);
    }
}
