//! # Módulo de Plantas
//!
//! Una planta es un grupo de trabajadores que procesan naranjas en paralelo.
//! Cada trabajador se ejecuta en su propio hilo y repite el mismo ciclo:
//! mientras la planta acepte trabajo, toma una naranja nueva, la lleva hasta
//! `Bottled` y actualiza los contadores compartidos de la planta.
//!
//! Los contadores son propios de cada planta; dos plantas nunca comparten
//! estado.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, Thread};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace};

use crate::config;
use crate::error::{PlantError, Result};
use crate::metrics::PlantSnapshot;
use crate::orange::{InterruptFlag, Orange, State};
use crate::pace::Pace;

/// Calcula cuántas botellas salen de una cantidad de naranjas procesadas.
///
/// # Examples
///
/// ```rust
/// use juice_plant_simulator::bottles_for;
///
/// assert_eq!(bottles_for(10), 3);
/// assert_eq!(bottles_for(0), 0);
/// ```
pub fn bottles_for(processed: u64) -> u64 {
    processed / config::ORANGES_PER_BOTTLE
}

/// Calcula cuántas naranjas procesadas sobran al llenar botellas completas.
///
/// # Examples
///
/// ```rust
/// use juice_plant_simulator::waste_for;
///
/// assert_eq!(waste_for(10), 1);
/// assert_eq!(waste_for(9), 0);
/// ```
pub fn waste_for(processed: u64) -> u64 {
    processed % config::ORANGES_PER_BOTTLE
}

/// Ciclo de vida de una planta.
///
/// `Created → Running → Draining → Stopped`, sin retorno desde `Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlantState {
    /// Construida, sin hilos lanzados.
    Created,
    /// Trabajadores activos y aceptando naranjas nuevas.
    Running,
    /// `stop` llamado; los trabajadores terminan la naranja en curso.
    Draining,
    /// Todos los trabajadores terminaron y fueron esperados.
    Stopped,
}

impl fmt::Display for PlantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Lo que hizo un trabajador durante su vida.
///
/// Cada trabajador lleva su propia cuenta local y la devuelve al terminar.
/// La suma de `bottled` de todos los reportes coincide con el contador
/// compartido de naranjas procesadas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Nombre del hilo, `Plant[N] Worker[M]`
    pub name: String,
    /// Naranjas que el trabajador tomó
    pub provided: u64,
    /// Naranjas que el trabajador llevó hasta `Bottled`
    pub bottled: u64,
}

#[derive(Debug, Default)]
struct Tally {
    provided: u64,
    processed: u64,
}

/// Fallas inyectadas en los trabajadores, solo en tests.
#[cfg(test)]
#[derive(Debug, Default)]
struct Faults {
    /// Trabajador (1-indexado) que intenta avanzar una naranja terminada
    failing: Option<usize>,
    /// Trabajador (1-indexado) que hace panic
    panicking: Option<usize>,
}

/// Estado compartido entre la planta y sus trabajadores.
#[derive(Debug, Default)]
struct Shared {
    time_to_work: AtomicBool,
    tally: Mutex<Tally>,
    #[cfg(test)]
    faults: Mutex<Faults>,
}

impl Shared {
    // Cada actualización es un único incremento, así que un lock envenenado
    // sigue teniendo contadores consistentes.
    fn tally(&self) -> MutexGuard<'_, Tally> {
        self.tally.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_time_to_work(&self) -> bool {
        self.time_to_work.load(Ordering::Acquire)
    }

    fn set_time_to_work(&self, value: bool) {
        self.time_to_work.store(value, Ordering::Release);
    }

    /// Lleva una naranja hasta `Bottled` y la cuenta como procesada.
    fn process_entire_orange(&self, mut orange: Orange) -> Result<()> {
        while orange.state() != State::Bottled {
            orange.run_process()?;
        }
        self.tally().processed += 1;
        Ok(())
    }

    /// Ciclo principal de un trabajador.
    fn run_worker(
        &self,
        name: String,
        number: usize,
        pace: Pace,
        interrupt: InterruptFlag,
    ) -> Result<WorkerReport> {
        info!(worker = %name, "procesando naranjas");

        let mut report = WorkerReport {
            name,
            ..WorkerReport::default()
        };

        while self.is_time_to_work() {
            #[cfg(test)]
            self.inject_fault(number)?;

            self.process_entire_orange(Orange::interruptible(pace, interrupt.clone()))?;
            report.bottled += 1;

            self.tally().provided += 1;
            report.provided += 1;
            trace!(worker = %report.name, provided = report.provided, "naranja embotellada");
        }

        info!(
            worker = %report.name,
            number,
            provided = report.provided,
            bottled = report.bottled,
            "trabajador terminado"
        );
        Ok(report)
    }

    #[cfg(test)]
    fn inject_fault(&self, number: usize) -> Result<()> {
        let faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        if faults.panicking == Some(number) {
            drop(faults);
            panic!("falla simulada del trabajador {}", number);
        }
        if faults.failing == Some(number) {
            drop(faults);
            let mut orange = Orange::with_pace(Pace::Instant);
            while !orange.state().is_final() {
                orange.run_process()?;
            }
            return self.process_entire_orange(orange);
        }
        Ok(())
    }
}

type WorkerHandle = JoinHandle<Result<WorkerReport>>;

struct Worker {
    name: String,
    interrupt: InterruptFlag,
    /// Hilo lanzado; se conserva después de esperar al trabajador
    thread: Option<Thread>,
    handle: Option<WorkerHandle>,
}

fn take_handles(workers: &mut [Worker]) -> Vec<(String, WorkerHandle)> {
    workers
        .iter_mut()
        .filter_map(|w| w.handle.take().map(|h| (w.name.clone(), h)))
        .collect()
}

struct Lifecycle {
    state: PlantState,
    workers: Vec<Worker>,
    reports: Vec<WorkerReport>,
}

/// Planta de jugo con un grupo fijo de trabajadores.
///
/// Todas las operaciones toman `&self`, así que una planta puede
/// compartirse entre hilos (por ejemplo dentro de un `Arc`) para que un hilo
/// la detenga mientras otro espera.
pub struct Plant {
    id: usize,
    worker_count: usize,
    pace: Pace,
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
    /// Serializa a quienes esperan a los trabajadores
    join_lock: Mutex<()>,
}

impl Plant {
    /// Crea una planta con las demoras reales de cada etapa.
    ///
    /// # Arguments
    ///
    /// * `id` - Identificador de la planta (se usa en los nombres de los hilos)
    /// * `worker_count` - Número de trabajadores que se lanzarán en `start`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use juice_plant_simulator::{Plant, PlantState};
    ///
    /// let plant = Plant::new(1, 3);
    /// assert_eq!(plant.state(), PlantState::Created);
    /// assert_eq!(plant.processed_count(), 0);
    /// ```
    pub fn new(id: usize, worker_count: usize) -> Self {
        Self::with_pace(id, worker_count, Pace::Realtime)
    }

    /// Crea una planta con el ritmo indicado. No lanza ningún hilo.
    pub fn with_pace(id: usize, worker_count: usize, pace: Pace) -> Self {
        let workers = (1..=worker_count)
            .map(|n| Worker {
                name: format!("Plant[{}] Worker[{}]", id, n),
                interrupt: InterruptFlag::new(),
                thread: None,
                handle: None,
            })
            .collect();

        Self {
            id,
            worker_count,
            pace,
            shared: Arc::new(Shared::default()),
            lifecycle: Mutex::new(Lifecycle {
                state: PlantState::Created,
                workers,
                reports: Vec::new(),
            }),
            join_lock: Mutex::new(()),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identificador de la planta.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Número de trabajadores configurados.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Ritmo de procesamiento de la planta.
    pub fn pace(&self) -> Pace {
        self.pace
    }

    /// Estado actual del ciclo de vida.
    pub fn state(&self) -> PlantState {
        self.lifecycle().state
    }

    /// Nombres de los trabajadores, en orden.
    pub fn worker_names(&self) -> Vec<String> {
        self.lifecycle()
            .workers
            .iter()
            .map(|w| w.name.clone())
            .collect()
    }

    /// Levanta la bandera de trabajo y lanza todos los trabajadores.
    ///
    /// # Errors
    ///
    /// - `PlantError::AlreadyStarted` si la planta ya no está en `Created`
    /// - `PlantError::Spawn` si no se pudo crear algún hilo; en ese caso los
    ///   trabajadores ya lanzados se detienen y la planta queda en `Stopped`
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state != PlantState::Created {
            return Err(PlantError::AlreadyStarted {
                plant: self.id,
                state: lifecycle.state,
            });
        }

        self.shared.set_time_to_work(true);

        let mut failure = None;
        for (index, worker) in lifecycle.workers.iter_mut().enumerate() {
            match self.spawn_worker(worker, index + 1) {
                Ok(handle) => {
                    worker.thread = Some(handle.thread().clone());
                    worker.handle = Some(handle);
                }
                Err(source) => {
                    failure = Some(PlantError::Spawn {
                        worker: worker.name.clone(),
                        source,
                    });
                    break;
                }
            }
        }

        if let Some(err) = failure {
            error!(plant = self.id, error = %err, "la planta no pudo arrancar");
            self.shared.set_time_to_work(false);
            let reports = self.join_workers(take_handles(&mut lifecycle.workers));
            lifecycle.reports.extend(reports);
            lifecycle.state = PlantState::Stopped;
            return Err(err);
        }

        lifecycle.state = PlantState::Running;
        info!(
            plant = self.id,
            workers = self.worker_count,
            pace = %self.pace,
            "planta iniciada"
        );
        Ok(())
    }

    fn spawn_worker(&self, worker: &Worker, number: usize) -> std::io::Result<WorkerHandle> {
        let shared = Arc::clone(&self.shared);
        let pace = self.pace;
        let name = worker.name.clone();
        let interrupt = worker.interrupt.clone();
        thread::Builder::new()
            .name(worker.name.clone())
            .spawn(move || shared.run_worker(name, number, pace, interrupt))
    }

    /// Baja la bandera de trabajo. No bloquea.
    ///
    /// Cada trabajador termina la naranja que está procesando y sale en la
    /// siguiente revisión de la bandera. Llamarlo más de una vez no tiene efecto.
    ///
    /// # Errors
    ///
    /// `PlantError::NotStarted` si la planta nunca arrancó.
    pub fn stop(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle();
        match lifecycle.state {
            PlantState::Created => Err(PlantError::NotStarted { plant: self.id }),
            PlantState::Running => {
                self.shared.set_time_to_work(false);
                lifecycle.state = PlantState::Draining;
                info!(plant = self.id, "deteniendo planta");
                Ok(())
            }
            PlantState::Draining | PlantState::Stopped => Ok(()),
        }
    }

    /// Bloquea hasta que todos los trabajadores terminen.
    ///
    /// No tiene límite de tiempo: si se llama antes de `stop`, espera hasta
    /// que otro hilo detenga la planta. Un trabajador que no puede esperarse
    /// limpiamente (falló o hizo panic) se reporta en el log y la espera
    /// continúa con los demás. Llamarlo otra vez tras terminar no tiene efecto.
    ///
    /// # Errors
    ///
    /// `PlantError::NotStarted` si la planta nunca arrancó.
    pub fn wait(&self) -> Result<()> {
        let _joining = self.join_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_stopped()? {
            return Ok(());
        }
        self.finish();
        Ok(())
    }

    /// Como `wait`, pero se rinde después de `timeout`.
    ///
    /// # Errors
    ///
    /// - `PlantError::NotStarted` si la planta nunca arrancó
    /// - `PlantError::WaitTimeout` si algún trabajador sigue activo al vencer
    ///   el plazo; la planta conserva su estado y se puede volver a esperar
    pub fn wait_timeout(&self, timeout: Duration) -> Result<()> {
        let _joining = self.join_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_stopped()? {
            return Ok(());
        }

        let deadline = Instant::now() + timeout;
        loop {
            let all_finished = self
                .lifecycle()
                .workers
                .iter()
                .all(|w| w.handle.as_ref().map_or(true, JoinHandle::is_finished));
            if all_finished {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(PlantError::WaitTimeout {
                    plant: self.id,
                    timeout,
                });
            }
            thread::sleep(config::WAIT_POLL_INTERVAL.min(deadline - now));
        }

        self.finish();
        Ok(())
    }

    /// Verifica que se pueda esperar a la planta. `true` si ya terminó.
    fn is_stopped(&self) -> Result<bool> {
        match self.lifecycle().state {
            PlantState::Created => Err(PlantError::NotStarted { plant: self.id }),
            PlantState::Stopped => Ok(true),
            PlantState::Running | PlantState::Draining => Ok(false),
        }
    }

    /// Espera a los trabajadores sin retener el lock del ciclo de vida,
    /// para que `stop` y los accesores sigan disponibles mientras tanto.
    fn finish(&self) {
        let pending = take_handles(&mut self.lifecycle().workers);
        let reports = self.join_workers(pending);

        let mut lifecycle = self.lifecycle();
        lifecycle.reports.extend(reports);
        lifecycle.state = PlantState::Stopped;
        debug!(plant = self.id, "todos los trabajadores terminaron");
    }

    fn join_workers(&self, handles: Vec<(String, WorkerHandle)>) -> Vec<WorkerReport> {
        handles
            .into_iter()
            .filter_map(|(name, handle)| match handle.join() {
                Ok(Ok(report)) => Some(report),
                Ok(Err(err)) => {
                    error!(worker = %name, error = %err, "el trabajador terminó con error");
                    None
                }
                Err(_) => {
                    error!(worker = %name, "falla al detener el trabajador");
                    None
                }
            })
            .collect()
    }

    /// Interrumpe la espera de la etapa en curso de cada trabajador.
    ///
    /// La naranja igual pasa a la siguiente etapa; solo se registra una
    /// advertencia de procesamiento incompleto. No detiene la planta y
    /// también alcanza a los trabajadores mientras otro hilo está en `wait`.
    ///
    /// # Returns
    ///
    /// Cuántos trabajadores fueron señalados (los que ya fueron lanzados)
    pub fn interrupt(&self) -> usize {
        let lifecycle = self.lifecycle();
        let mut signalled = 0;
        for worker in &lifecycle.workers {
            if let Some(thread) = &worker.thread {
                worker.interrupt.raise();
                thread.unpark();
                signalled += 1;
            }
        }
        debug!(plant = self.id, signalled, "trabajadores interrumpidos");
        signalled
    }

    /// Naranjas tomadas por los trabajadores.
    pub fn provided_count(&self) -> u64 {
        self.shared.tally().provided
    }

    /// Naranjas llevadas hasta `Bottled`.
    pub fn processed_count(&self) -> u64 {
        self.shared.tally().processed
    }

    /// Botellas completas producidas.
    pub fn bottle_count(&self) -> u64 {
        bottles_for(self.processed_count())
    }

    /// Naranjas procesadas que no alcanzaron para otra botella.
    pub fn waste_count(&self) -> u64 {
        waste_for(self.processed_count())
    }

    /// Reportes de los trabajadores que terminaron limpiamente.
    ///
    /// Solo está completo después de que `wait` retorna.
    pub fn worker_reports(&self) -> Vec<WorkerReport> {
        self.lifecycle().reports.clone()
    }

    /// Toma una foto de los contadores de la planta.
    pub fn snapshot(&self) -> PlantSnapshot {
        let (provided, processed) = {
            let tally = self.shared.tally();
            (tally.provided, tally.processed)
        };
        PlantSnapshot {
            plant_id: self.id,
            provided,
            processed,
            bottles: bottles_for(processed),
            waste: waste_for(processed),
        }
    }
}

impl fmt::Debug for Plant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plant")
            .field("id", &self.id)
            .field("worker_count", &self.worker_count)
            .field("pace", &self.pace)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for Plant {
    // Los hilos que nadie esperó salen al terminar su naranja actual
    fn drop(&mut self) {
        self.shared.set_time_to_work(false);
    }
}
