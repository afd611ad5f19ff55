use crate::config::SimulationConfig;
use crate::core::configuration::ComponentConfigurationTree;
use crate::core::heat_loss::{format_heat_loss_rate, HeatLossRate};
use crate::core::house_component::{ComponentType, HouseComponentInsulation, Size};
use crate::core::material::{Insulation, InsulationCatalog, MaterialUpdate};
use crate::errors::SimulationError;
use crate::simulation::clock::{Scheduler, TickHandle};
use crate::simulation::history::{Action, HistoryCell, SimulationHistory};
use crate::simulation::snapshot::{
    OutdoorTemperature, SimulationSnapshot, SnapshotChanges, WeatherStep,
};
use crate::temperature_iterator::{SlidingWindowIterator, TemperatureSample};
use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};
use smartstring::alias::String as ComponentId;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// A window was pulled from the temperature input.
    Advanced { window: usize },
    /// A previously visited snapshot was stepped into again.
    Replayed,
    /// Another tick was still in flight.
    Skipped,
    /// No temperature input is left.
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progression {
    pub percent_complete: f64,
    pub estimated_seconds_remaining: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CurrentHeatLoss {
    pub global: HeatLossRate,
    /// W per component id.
    pub per_component: IndexMap<ComponentId, f64>,
}

/// Everything a host needs to drive a simulation: house edits, the clock, time travel
/// and the read side. All methods take `&self` and may be called from any thread.
pub struct SimulationController {
    config: SimulationConfig,
    initial_weather: f64,
    iterator: Mutex<SlidingWindowIterator>,
    history: HistoryCell,
    // held while the history or the input cursor changes
    step_lock: Mutex<()>,
    running: AtomicBool,
    tick_handle: Mutex<Option<TickHandle>>,
}

impl SimulationController {
    pub fn new(
        config: SimulationConfig,
        samples: impl Into<Arc<[TemperatureSample]>>,
    ) -> Result<Self, SimulationError> {
        let samples = samples.into();
        let initial_weather = samples
            .first()
            .map_or(config.indoor_temperature, |sample| sample.temperature);
        let initial = SimulationSnapshot::new(
            config.indoor_temperature,
            initial_weather,
            config.number_of_floors,
            config.price_per_kwh,
            Arc::new(config.build_tree()?),
            config.layer_topology,
        )?;
        let iterator = SlidingWindowIterator::new(
            samples,
            config.sampling_unit,
            Some(config.window_length),
        );
        info!(
            components = initial.house_configuration().len(),
            windows = iterator.total_windows(),
            "simulation created"
        );

        Ok(Self {
            config,
            initial_weather,
            iterator: Mutex::new(iterator),
            history: HistoryCell::new(SimulationHistory::new(initial)),
            step_lock: Mutex::new(()),
            running: AtomicBool::new(false),
            tick_handle: Mutex::new(None),
        })
    }

    /// Add a component to the house. It starts with the insulation its type currently uses.
    #[instrument(skip(self))]
    pub fn register_component(
        &self,
        component_id: &str,
        parent_id: Option<&str>,
        component_type: ComponentType,
        size: Size,
    ) -> Result<(), SimulationError> {
        self.edit_current(|current| {
            let tree = current.house_configuration();
            let insulation = match tree.get_first_of_type(component_type)? {
                Some((_, component)) => {
                    Insulation::new(&component.insulation_name, component.building_materials)
                }
                None => self.catalog().default_for(component_type)?.clone(),
            };
            Ok(house_changes(tree.with_component(
                parent_id,
                component_id,
                HouseComponentInsulation::new(component_type, &insulation, size),
            )?))
        })
    }

    #[instrument(skip(self))]
    pub fn unregister_component(&self, component_id: &str) -> Result<(), SimulationError> {
        self.edit_current(|current| {
            Ok(house_changes(
                current
                    .house_configuration()
                    .without_component(component_id)?,
            ))
        })
    }

    /// Swap every component of `component_type` to the named catalog preset.
    #[instrument(skip(self))]
    pub fn change_component_insulation(
        &self,
        component_type: ComponentType,
        insulation_name: &str,
    ) -> Result<(), SimulationError> {
        let insulation = self.catalog().insulation(component_type, insulation_name)?;
        self.edit_current(|current| {
            Ok(house_changes(
                current
                    .house_configuration()
                    .with_new_insulation(component_type, insulation)?,
            ))
        })
    }

    #[instrument(skip(self))]
    pub fn update_composition_of_insulation(
        &self,
        component_type: ComponentType,
        update: &MaterialUpdate,
    ) -> Result<(), SimulationError> {
        self.edit_current(|current| {
            Ok(house_changes(
                current
                    .house_configuration()
                    .with_updated_material(component_type, update)?,
            ))
        })
    }

    /// Edit the parameters of the current step. Any previously visited future is dropped.
    #[instrument(skip(self))]
    pub fn update_parameters(&self, changes: SnapshotChanges) -> Result<(), SimulationError> {
        self.edit_current(|_| Ok(changes))
    }

    /// Derive changes from the current snapshot and apply them, with no tick or other edit
    /// in between. When the future is dropped the input cursor moves back with the history,
    /// so the dropped windows are read again by the next ticks.
    fn edit_current(
        &self,
        edit: impl FnOnce(&SimulationSnapshot) -> Result<SnapshotChanges, SimulationError>,
    ) -> Result<(), SimulationError> {
        let _guard = self.step_lock.lock();
        let changes = edit(self.history.load().current())?;
        let history = self.history.dispatch(Action::UpdateCurrent(changes))?;

        let mut iterator = self.iterator.lock();
        if iterator.current_index() != history.current_index() {
            debug!(
                from = iterator.current_index(),
                to = history.current_index(),
                "input cursor moved back to the edited step"
            );
            iterator.seek(history.current_index());
        }

        Ok(())
    }

    /// One clock step. Overlapping calls are skipped rather than queued.
    pub fn tick(&self) -> Result<TickOutcome, SimulationError> {
        let Some(guard) = self.step_lock.try_lock() else {
            debug!("tick skipped while another is in flight");
            return Ok(TickOutcome::Skipped);
        };
        self.step(&guard)
    }

    fn step(&self, _guard: &MutexGuard<()>) -> Result<TickOutcome, SimulationError> {
        let history = self.history.load();
        if let Some(next) = history.next_in_future() {
            self.history
                .dispatch(Action::Advance(vec![next.weather_step()]))?;
            return Ok(TickOutcome::Replayed);
        }

        let mut iterator = self.iterator.lock();
        if !iterator.has_more() {
            return Ok(TickOutcome::Finished);
        }
        // only commit the cursor once the step has been accepted
        let mut next_iterator = iterator.clone();
        let window = next_iterator.get_next()?;
        self.history
            .dispatch(Action::Advance(vec![WeatherStep::from(&window)]))?;
        *iterator = next_iterator;

        Ok(TickOutcome::Advanced {
            window: window.index,
        })
    }

    /// Start ticking on `scheduler` at the configured interval. Does nothing if already running.
    pub fn start_simulation(self: &Arc<Self>, scheduler: &dyn Scheduler) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(interval = ?self.config.tick_interval(), "simulation started");

        let controller = Arc::downgrade(self);
        let handle = scheduler.schedule_repeating(
            self.config.tick_interval(),
            Box::new(move || {
                let Some(controller) = controller.upgrade() else {
                    return ControlFlow::Break(());
                };
                match controller.tick() {
                    Ok(TickOutcome::Finished) => {
                        info!("simulation finished");
                        controller.pause();
                        ControlFlow::Break(())
                    }
                    Ok(_) => ControlFlow::Continue(()),
                    Err(error) => {
                        warn!(%error, "simulation tick failed");
                        controller.pause();
                        ControlFlow::Break(())
                    }
                }
            }),
        );
        *self.tick_handle.lock() = Some(handle);
    }

    /// Stop the clock. The history is left where the last completed tick put it.
    pub fn pause(&self) {
        if let Some(handle) = self.tick_handle.lock().take() {
            handle.cancel();
        }
        if self.running.swap(false, Ordering::SeqCst) {
            info!("simulation paused");
        }
    }

    /// Travel to the snapshot at `index`: back through the past, or forward through
    /// snapshots already visited. Never pulls new temperature input.
    #[instrument(skip(self))]
    pub fn go_to_day(&self, index: isize) -> Result<(), SimulationError> {
        let _guard = self.step_lock.lock();
        let history = self.history.load();
        let current = history.current_index() as isize;

        if index <= current {
            self.history.dispatch(Action::Rewind(index))?;
        } else {
            let steps = history
                .future()
                .take((index - current) as usize)
                .map(SimulationSnapshot::weather_step)
                .collect();
            self.history.dispatch(Action::Advance(steps))?;
        }

        Ok(())
    }

    /// Pause, rewind the temperature input and start over from a single snapshot.
    #[instrument(skip(self))]
    pub fn reset(&self) -> Result<(), SimulationError> {
        self.pause();
        let _guard = self.step_lock.lock();
        self.history.dispatch(Action::Reset {
            weather_value: self.initial_weather,
        })?;
        self.iterator.lock().reset();

        Ok(())
    }

    /// Tick until the temperature input is exhausted. Returns the number of steps taken.
    pub fn run_to_end(&self) -> Result<usize, SimulationError> {
        let guard = self.step_lock.lock();
        let mut steps = 0;
        while self.step(&guard)? != TickOutcome::Finished {
            steps += 1;
        }
        debug!(steps, "ran to end");

        Ok(steps)
    }

    pub fn history(&self) -> Arc<SimulationHistory> {
        self.history.load()
    }

    pub fn current_heat_loss(&self) -> CurrentHeatLoss {
        let history = self.history.load();
        let heat_loss = history.current().heat_loss();
        CurrentHeatLoss {
            global: format_heat_loss_rate(heat_loss.global),
            per_component: heat_loss.per_component.clone(),
        }
    }

    /// kWh lost up to the current step.
    pub fn cumulative_heat_loss(&self) -> f64 {
        self.history.load().current().cumulative_heat_loss()
    }

    pub fn electricity_cost(&self) -> f64 {
        self.history.load().current().cumulative_cost()
    }

    pub fn indoor_temperature(&self) -> f64 {
        self.history.load().current().indoor_temperature()
    }

    pub fn outdoor_temperature(&self) -> OutdoorTemperature {
        self.history.load().current().outdoor_temperature()
    }

    pub fn progression(&self) -> Progression {
        let total = self.iterator.lock().total_windows();
        if total == 0 {
            return Progression {
                percent_complete: 100.,
                estimated_seconds_remaining: 0.,
            };
        }
        let steps = self.history.load().current_index().min(total);

        Progression {
            percent_complete: steps as f64 / total as f64 * 100.,
            estimated_seconds_remaining: (total - steps) as f64
                * self.config.tick_interval().as_secs_f64(),
        }
    }

    /// Simulated hours up to the current step.
    pub fn simulation_duration_hours(&self) -> f64 {
        self.history
            .load()
            .past()
            .map(SimulationSnapshot::step_hours)
            .sum()
    }

    /// Simulated hours covered by the whole temperature input.
    pub fn total_duration_hours(&self) -> f64 {
        self.iterator.lock().total_hours()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn catalog(&self) -> &InsulationCatalog {
        &self.config.insulation_catalog
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

fn house_changes(tree: ComponentConfigurationTree) -> SnapshotChanges {
    SnapshotChanges {
        house_configuration: Some(Arc::new(tree)),
        ..Default::default()
    }
}

impl Drop for SimulationController {
    fn drop(&mut self) {
        if let Some(handle) = self.tick_handle.get_mut().take() {
            handle.cancel();
        }
    }
}
