use crate::errors::HistoryError;
use crate::simulation::snapshot::{SimulationSnapshot, SnapshotChanges, WeatherStep};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// The closed set of transitions a [`SimulationHistory`] goes through.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Collapse the history to a single snapshot with zeroed totals.
    Reset { weather_value: f64 },
    /// Step forward once per weather step, replaying already visited snapshots first.
    Advance(Vec<WeatherStep>),
    /// Keep `past` up to and including the given index and move the rest into `future`.
    Rewind(isize),
    /// Edit the current snapshot. Any future is abandoned.
    UpdateCurrent(SnapshotChanges),
}

/// Visited snapshots and the ones rewound past. The current snapshot is the last of `past`,
/// which is never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationHistory {
    past: Vec<Arc<SimulationSnapshot>>,
    future: VecDeque<Arc<SimulationSnapshot>>,
}

impl SimulationHistory {
    pub fn new(initial: SimulationSnapshot) -> Self {
        Self {
            past: vec![Arc::new(initial)],
            future: Default::default(),
        }
    }

    pub fn from_snapshots(
        past: Vec<SimulationSnapshot>,
        future: Vec<SimulationSnapshot>,
    ) -> Result<Self, HistoryError> {
        if past.is_empty() {
            return Err(HistoryError::EmptyHistory);
        }

        Ok(Self {
            past: past.into_iter().map(Arc::new).collect(),
            future: future.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn reduce(&self, action: Action) -> Result<Self, HistoryError> {
        match action {
            Action::Reset { weather_value } => self.reset(weather_value),
            Action::Advance(steps) => self.advance(&steps),
            Action::Rewind(index) => self.rewind(index),
            Action::UpdateCurrent(changes) => self.update_current(changes),
        }
    }

    fn reset(&self, weather_value: f64) -> Result<Self, HistoryError> {
        debug!(weather_value, "history reset");
        Ok(Self::new(self.current().restarted(weather_value)?))
    }

    fn advance(&self, steps: &[WeatherStep]) -> Result<Self, HistoryError> {
        let mut next = self.clone();
        let replayed = steps.len().min(next.future.len());
        for (snapshot, step) in next.future.iter().zip(steps) {
            let visited = snapshot.weather_step();
            if visited.temperature != step.temperature || visited.period != step.period {
                warn!(
                    visited = visited.temperature,
                    requested = step.temperature,
                    "replaying a visited step with the weather it was computed from"
                );
            }
        }
        next.past.extend(next.future.drain(..replayed));

        for step in &steps[replayed..] {
            let snapshot = next.current().advanced(step)?;
            next.past.push(Arc::new(snapshot));
        }
        debug!(
            replayed,
            computed = steps.len() - replayed,
            "history advanced"
        );

        Ok(next)
    }

    fn rewind(&self, index: isize) -> Result<Self, HistoryError> {
        if index < 0 {
            return Err(HistoryError::NegativeIndex(index));
        }

        let mut next = self.clone();
        let keep = (index as usize + 1).min(next.past.len());
        for snapshot in next.past.split_off(keep).into_iter().rev() {
            next.future.push_front(snapshot);
        }
        debug!(index, future = next.future.len(), "history rewound");

        Ok(next)
    }

    fn update_current(&self, changes: SnapshotChanges) -> Result<Self, HistoryError> {
        let mut past = self.past.clone();
        let current = past.pop().ok_or(HistoryError::EmptyHistory)?;
        let updated = current
            .with_changes(changes)?
            .rederived_after(past.last().map(Arc::as_ref))?;
        past.push(Arc::new(updated));
        if !self.future.is_empty() {
            debug!(discarded = self.future.len(), "future abandoned");
        }

        Ok(Self {
            past,
            future: Default::default(),
        })
    }

    pub fn current(&self) -> &SimulationSnapshot {
        // past is never empty
        &self.past[self.past.len() - 1]
    }

    /// Index of the current snapshot, which is also the number of steps taken.
    pub fn current_index(&self) -> usize {
        self.past.len() - 1
    }

    pub fn past(&self) -> impl ExactSizeIterator<Item = &SimulationSnapshot> {
        self.past.iter().map(Arc::as_ref)
    }

    pub fn future(&self) -> impl ExactSizeIterator<Item = &SimulationSnapshot> {
        self.future.iter().map(Arc::as_ref)
    }

    pub fn next_in_future(&self) -> Option<&SimulationSnapshot> {
        self.future.front().map(Arc::as_ref)
    }
}

/// Shared holder of the current history. Actions are applied under the write lock and
/// their result swapped in; readers get the history as it was when they asked.
#[derive(Debug)]
pub struct HistoryCell(RwLock<Arc<SimulationHistory>>);

impl HistoryCell {
    pub fn new(history: SimulationHistory) -> Self {
        Self(RwLock::new(Arc::new(history)))
    }

    /// Apply `action`. On error the held history is left as it was.
    pub fn dispatch(&self, action: Action) -> Result<Arc<SimulationHistory>, HistoryError> {
        let mut history = self.0.write();
        let next = Arc::new(history.reduce(action)?);
        *history = next.clone();

        Ok(next)
    }

    pub fn load(&self) -> Arc<SimulationHistory> {
        self.0.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::configuration::ComponentConfigurationTree;
    use crate::core::heat_loss::LayerTopology;
    use crate::core::house_component::{ComponentType, HouseComponentInsulation, Size};
    use crate::core::material::{Insulation, Material};
    use crate::simulation::snapshot::OutdoorTemperatureChange;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn history() -> SimulationHistory {
        let insulation = Insulation::new("plain", vec![Material::new("plain", 0.1, 10., 0.1)]);
        let tree = ComponentConfigurationTree::new()
            .with_component(
                None,
                "wall",
                HouseComponentInsulation::new(ComponentType::Wall, &insulation, Size::new(5., 2.)),
            )
            .unwrap();
        let initial =
            SimulationSnapshot::new(20., 10., 1, 0.5, Arc::new(tree), LayerTopology::Independent)
                .unwrap();
        SimulationHistory::new(initial)
    }

    fn steps(temperatures: &[f64]) -> Vec<WeatherStep> {
        temperatures
            .iter()
            .map(|temperature| WeatherStep::new(*temperature, 24.))
            .collect()
    }

    #[rstest]
    fn should_start_with_a_single_snapshot(history: SimulationHistory) {
        assert_eq!(history.past().len(), 1);
        assert_eq!(history.future().len(), 0);
        assert_eq!(history.current_index(), 0);
    }

    #[rstest]
    fn should_append_one_snapshot_per_step(history: SimulationHistory) {
        let advanced = history
            .reduce(Action::Advance(steps(&[0., 5., 10.])))
            .unwrap();

        assert_eq!(advanced.past().len(), 4);
        assert_eq!(advanced.current().outdoor_temperature().value, 10.);
        // 200 W, 150 W and 100 W, each for a day
        assert_relative_eq!(
            advanced.current().cumulative_heat_loss(),
            10.8,
            max_relative = 1e-9
        );
        assert_eq!(history.past().len(), 1);
    }

    #[rstest]
    fn should_conserve_snapshot_count_when_rewinding(history: SimulationHistory) {
        let advanced = history
            .reduce(Action::Advance(steps(&[0., 5., 10.])))
            .unwrap();
        let rewound = advanced.reduce(Action::Rewind(1)).unwrap();

        assert_eq!(rewound.past().len(), 2);
        assert_eq!(rewound.future().len(), 2);
        assert_eq!(rewound.current().outdoor_temperature().value, 0.);
        assert_eq!(
            rewound.next_in_future().unwrap().outdoor_temperature().value,
            5.
        );

        let rewound_again = rewound.reduce(Action::Rewind(0)).unwrap();
        assert_eq!(rewound_again.past().len(), 1);
        let future: Vec<f64> = rewound_again
            .future()
            .map(|snapshot| snapshot.outdoor_temperature().value)
            .collect();
        assert_eq!(future, vec![0., 5., 10.]);
    }

    #[rstest]
    fn should_keep_everything_when_rewinding_past_the_end(history: SimulationHistory) {
        let advanced = history.reduce(Action::Advance(steps(&[0.]))).unwrap();
        assert_eq!(advanced.reduce(Action::Rewind(5)).unwrap(), advanced);
    }

    #[rstest]
    fn should_replay_future_identically(history: SimulationHistory) {
        let forward = history
            .reduce(Action::Advance(steps(&[0., 5., 10.])))
            .unwrap();
        let replayed = forward
            .reduce(Action::Rewind(1))
            .unwrap()
            .reduce(Action::Advance(steps(&[5., 10.])))
            .unwrap();

        assert_eq!(replayed, forward);
    }

    #[rstest]
    fn should_compute_fresh_steps_beyond_the_future(history: SimulationHistory) {
        let rewound = history
            .reduce(Action::Advance(steps(&[0., 5.])))
            .unwrap()
            .reduce(Action::Rewind(1))
            .unwrap();
        let advanced = rewound
            .reduce(Action::Advance(steps(&[99., -10.])))
            .unwrap();

        let outdoor: Vec<f64> = advanced
            .past()
            .map(|snapshot| snapshot.outdoor_temperature().value)
            .collect();
        assert_eq!(outdoor, vec![10., 0., 5., -10.]);
        assert_eq!(advanced.future().len(), 0);
    }

    #[rstest]
    fn should_keep_visited_snapshot_when_replayed_with_other_weather(history: SimulationHistory) {
        let forward = history
            .reduce(Action::Advance(steps(&[0., 5.])))
            .unwrap();
        let rewound = forward.reduce(Action::Rewind(1)).unwrap();

        let replayed = rewound.reduce(Action::Advance(steps(&[-20.]))).unwrap();

        assert_eq!(replayed, forward);
        assert_eq!(replayed.current().outdoor_temperature().weather_value, 5.);
    }

    #[rstest]
    fn should_reject_negative_rewind(history: SimulationHistory) {
        assert_eq!(
            history.reduce(Action::Rewind(-1)).unwrap_err(),
            HistoryError::NegativeIndex(-1)
        );
    }

    #[rstest]
    fn should_discard_future_when_updating_current(history: SimulationHistory) {
        let rewound = history
            .reduce(Action::Advance(steps(&[0., 5., 10.])))
            .unwrap()
            .reduce(Action::Rewind(1))
            .unwrap();
        let updated = rewound
            .reduce(Action::UpdateCurrent(SnapshotChanges {
                indoor_temperature: Some(22.),
                ..Default::default()
            }))
            .unwrap();

        assert_eq!(updated.past().len(), 2);
        assert_eq!(updated.future().len(), 0);
        assert_eq!(updated.current().indoor_temperature(), 22.);
        // the edited step is re-accumulated: 220 W for a day
        assert_relative_eq!(
            updated.current().cumulative_heat_loss(),
            5.28,
            max_relative = 1e-9
        );

        let recomputed = updated.reduce(Action::Advance(steps(&[5.]))).unwrap();
        assert_relative_eq!(
            recomputed.current().heat_loss().global,
            170.,
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn should_reset_to_a_single_snapshot_with_zero_totals(history: SimulationHistory) {
        let reset = history
            .reduce(Action::Advance(steps(&[0., 5.])))
            .unwrap()
            .reduce(Action::Reset { weather_value: 3. })
            .unwrap();

        assert_eq!(reset.past().len(), 1);
        assert_eq!(reset.future().len(), 0);
        assert_eq!(reset.current().cumulative_heat_loss(), 0.);
        assert_eq!(reset.current().outdoor_temperature().value, 3.);
    }

    #[rstest]
    fn should_keep_override_on_reset(history: SimulationHistory) {
        let reset = history
            .reduce(Action::UpdateCurrent(SnapshotChanges {
                outdoor_temperature: Some(OutdoorTemperatureChange::Override(-2.)),
                ..Default::default()
            }))
            .unwrap()
            .reduce(Action::Reset { weather_value: 3. })
            .unwrap();

        assert_eq!(reset.current().outdoor_temperature().value, -2.);
        assert_eq!(reset.current().outdoor_temperature().weather_value, 3.);
    }

    #[rstest]
    fn should_refuse_an_empty_history() {
        assert_eq!(
            SimulationHistory::from_snapshots(vec![], vec![]).unwrap_err(),
            HistoryError::EmptyHistory
        );
    }

    #[rstest]
    fn should_leave_cell_untouched_when_action_fails(history: SimulationHistory) {
        let cell = HistoryCell::new(history);
        let before = cell.load();

        assert!(cell.dispatch(Action::Rewind(-3)).is_err());
        assert_eq!(cell.load(), before);

        let after = cell.dispatch(Action::Advance(steps(&[0.]))).unwrap();
        assert_eq!(cell.load(), after);
        assert_eq!(before.past().len(), 1);
    }
}
