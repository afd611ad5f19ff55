use crate::core::configuration::ComponentConfigurationTree;
use crate::core::heat_loss::{
    component_heat_loss_factor, energy_cost, instantaneous_heat_loss, LayerTopology,
};
use crate::core::units::watt_hours_to_kilowatt_hours;
use crate::errors::{HistoryError, PhysicsError};
use crate::temperature_iterator::{Period, SlidingWindow};
use indexmap::IndexMap;
use smartstring::alias::String as ComponentId;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutdoorTemperature {
    pub user_override: bool,
    /// Latest value coming from the temperature input.
    pub weather_value: f64,
    /// Value the heat loss is computed with.
    pub value: f64,
}

impl OutdoorTemperature {
    pub fn from_weather(weather_value: f64) -> Self {
        Self {
            user_override: false,
            weather_value,
            value: weather_value,
        }
    }

    fn with_change(&self, change: OutdoorTemperatureChange) -> Self {
        match change {
            OutdoorTemperatureChange::Weather(weather_value) => Self {
                weather_value,
                value: if self.user_override {
                    self.value
                } else {
                    weather_value
                },
                ..*self
            },
            OutdoorTemperatureChange::Override(value) => Self {
                user_override: true,
                value,
                ..*self
            },
            OutdoorTemperatureChange::ClearOverride => Self::from_weather(self.weather_value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutdoorTemperatureChange {
    /// A new reading from the temperature input. An active user override keeps its value.
    Weather(f64),
    Override(f64),
    ClearOverride,
}

/// Heat loss rates in W.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeatLoss {
    pub global: f64,
    pub per_component: IndexMap<ComponentId, f64>,
}

/// Partial update of a snapshot. Fields left as `None` are copied from the receiver.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapshotChanges {
    pub indoor_temperature: Option<f64>,
    pub outdoor_temperature: Option<OutdoorTemperatureChange>,
    pub number_of_floors: Option<u32>,
    pub price_per_kwh: Option<f64>,
    pub house_configuration: Option<Arc<ComponentConfigurationTree>>,
    pub layer_topology: Option<LayerTopology>,
}

/// Outdoor conditions of one simulation step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeatherStep {
    pub temperature: f64,
    pub duration_hours: f64,
    pub period: Option<Period>,
}

impl WeatherStep {
    pub fn new(temperature: f64, duration_hours: f64) -> Self {
        Self {
            temperature,
            duration_hours,
            period: None,
        }
    }
}

impl From<&SlidingWindow> for WeatherStep {
    fn from(window: &SlidingWindow) -> Self {
        Self {
            temperature: window.mean,
            duration_hours: window.period.duration_hours,
            period: Some(window.period),
        }
    }
}

/// Full input and derived state of one simulated instant.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSnapshot {
    indoor_temperature: f64,
    outdoor_temperature: OutdoorTemperature,
    number_of_floors: u32,
    price_per_kwh: f64,
    heat_loss: HeatLoss,
    cumulative_heat_loss: f64, // kWh
    cumulative_cost: f64,
    house_configuration: Arc<ComponentConfigurationTree>,
    layer_topology: LayerTopology,
    step_hours: f64,
    period: Option<Period>,
}

impl SimulationSnapshot {
    pub fn new(
        indoor_temperature: f64,
        outdoor_temperature: f64,
        number_of_floors: u32,
        price_per_kwh: f64,
        house_configuration: Arc<ComponentConfigurationTree>,
        layer_topology: LayerTopology,
    ) -> Result<Self, HistoryError> {
        if price_per_kwh <= 0. {
            return Err(PhysicsError::NonPositivePrice(price_per_kwh).into());
        }

        let mut snapshot = Self {
            indoor_temperature,
            outdoor_temperature: OutdoorTemperature::from_weather(outdoor_temperature),
            number_of_floors,
            price_per_kwh,
            heat_loss: Default::default(),
            cumulative_heat_loss: 0.,
            cumulative_cost: 0.,
            house_configuration,
            layer_topology,
            step_hours: 0.,
            period: None,
        };
        snapshot.heat_loss = snapshot.calculate_heat_loss()?;

        Ok(snapshot)
    }

    /// A new snapshot with `changes` applied and the heat loss recomputed.
    /// Cumulative totals are copied unchanged.
    pub fn with_changes(&self, changes: SnapshotChanges) -> Result<Self, HistoryError> {
        let price_per_kwh = changes.price_per_kwh.unwrap_or(self.price_per_kwh);
        if price_per_kwh <= 0. {
            return Err(PhysicsError::NonPositivePrice(price_per_kwh).into());
        }

        let mut snapshot = Self {
            indoor_temperature: changes
                .indoor_temperature
                .unwrap_or(self.indoor_temperature),
            outdoor_temperature: changes
                .outdoor_temperature
                .map_or(self.outdoor_temperature, |change| {
                    self.outdoor_temperature.with_change(change)
                }),
            number_of_floors: changes.number_of_floors.unwrap_or(self.number_of_floors),
            price_per_kwh,
            house_configuration: changes
                .house_configuration
                .unwrap_or_else(|| self.house_configuration.clone()),
            layer_topology: changes.layer_topology.unwrap_or(self.layer_topology),
            ..self.clone()
        };
        snapshot.heat_loss = snapshot.calculate_heat_loss()?;

        Ok(snapshot)
    }

    /// The snapshot following this one after `step`, with the step's energy and cost added
    /// to the running totals.
    pub fn advanced(&self, step: &WeatherStep) -> Result<Self, HistoryError> {
        let mut snapshot = self.with_changes(SnapshotChanges {
            outdoor_temperature: Some(OutdoorTemperatureChange::Weather(step.temperature)),
            ..Default::default()
        })?;
        snapshot.step_hours = step.duration_hours;
        snapshot.period = step.period;
        snapshot.accumulate_from(self.cumulative_heat_loss, self.cumulative_cost)?;

        Ok(snapshot)
    }

    /// Recompute this snapshot's totals on top of the totals of the snapshot before it.
    pub(crate) fn rederived_after(
        mut self,
        previous: Option<&SimulationSnapshot>,
    ) -> Result<Self, HistoryError> {
        let (heat_loss, cost) = previous.map_or((0., 0.), |previous| {
            (previous.cumulative_heat_loss, previous.cumulative_cost)
        });
        self.accumulate_from(heat_loss, cost)?;

        Ok(self)
    }

    /// Start of a new run: no elapsed time and zeroed totals.
    pub(crate) fn restarted(&self, weather_value: f64) -> Result<Self, HistoryError> {
        let mut snapshot = self.with_changes(SnapshotChanges {
            outdoor_temperature: Some(OutdoorTemperatureChange::Weather(weather_value)),
            ..Default::default()
        })?;
        snapshot.cumulative_heat_loss = 0.;
        snapshot.cumulative_cost = 0.;
        snapshot.step_hours = 0.;
        snapshot.period = None;

        Ok(snapshot)
    }

    pub fn step_energy(&self) -> f64 {
        watt_hours_to_kilowatt_hours(self.heat_loss.global * self.step_hours)
    }

    /// The weather this snapshot was computed from.
    pub fn weather_step(&self) -> WeatherStep {
        WeatherStep {
            temperature: self.outdoor_temperature.weather_value,
            duration_hours: self.step_hours,
            period: self.period,
        }
    }

    fn accumulate_from(
        &mut self,
        previous_heat_loss: f64,
        previous_cost: f64,
    ) -> Result<(), PhysicsError> {
        let step_energy = self.step_energy();
        self.cumulative_heat_loss = previous_heat_loss + step_energy;
        self.cumulative_cost = previous_cost + energy_cost(self.price_per_kwh, step_energy)?;

        Ok(())
    }

    fn calculate_heat_loss(&self) -> Result<HeatLoss, HistoryError> {
        let mut per_component = IndexMap::new();
        for (component_id, component) in self.house_configuration.get_all()? {
            let factor = component_heat_loss_factor(
                &component.building_materials,
                component.actual_area,
                self.layer_topology,
            )?;
            per_component.insert(
                component_id,
                instantaneous_heat_loss(
                    factor,
                    self.indoor_temperature,
                    self.outdoor_temperature.value,
                ),
            );
        }
        let global = per_component.values().sum::<f64>() * self.number_of_floors as f64;

        Ok(HeatLoss {
            global,
            per_component,
        })
    }

    pub fn indoor_temperature(&self) -> f64 {
        self.indoor_temperature
    }

    pub fn outdoor_temperature(&self) -> OutdoorTemperature {
        self.outdoor_temperature
    }

    pub fn number_of_floors(&self) -> u32 {
        self.number_of_floors
    }

    pub fn price_per_kwh(&self) -> f64 {
        self.price_per_kwh
    }

    pub fn heat_loss(&self) -> &HeatLoss {
        &self.heat_loss
    }

    pub fn cumulative_heat_loss(&self) -> f64 {
        self.cumulative_heat_loss
    }

    /// Cumulative electricity cost rounded to whole currency units.
    pub fn cumulative_cost(&self) -> f64 {
        self.cumulative_cost.round()
    }

    pub fn house_configuration(&self) -> &Arc<ComponentConfigurationTree> {
        &self.house_configuration
    }

    pub fn layer_topology(&self) -> LayerTopology {
        self.layer_topology
    }

    pub fn step_hours(&self) -> f64 {
        self.step_hours
    }

    pub fn period(&self) -> Option<Period> {
        self.period
    }
}
