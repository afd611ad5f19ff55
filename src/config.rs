use crate::core::configuration::ComponentConfigurationTree;
use crate::core::heat_loss::LayerTopology;
use crate::core::house_component::{ComponentType, HouseComponentInsulation, Size};
use crate::core::material::InsulationCatalog;
use crate::core::units::{TimeUnit, WindowLength};
use crate::errors::ConfigurationError;
use anyhow::{anyhow, bail};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::io::Read;
use std::time::Duration;

pub const DEFAULT_INDOOR_TEMPERATURE: f64 = 20.; // deg C
pub const DEFAULT_PRICE_PER_KWH: f64 = 0.25;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

/// Numeric parameters, catalog and initial house layout for one simulation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub indoor_temperature: f64,
    #[validate(exclusive_minimum = 0.)]
    pub price_per_kwh: f64,
    #[validate(minimum = 1)]
    pub number_of_floors: u32,
    #[validate]
    pub window_length: WindowLength,
    pub sampling_unit: TimeUnit,
    #[validate(minimum = 1)]
    pub tick_interval_ms: u64,
    pub layer_topology: LayerTopology,
    pub insulation_catalog: InsulationCatalog,
    #[validate]
    pub components: Vec<ComponentConfig>,
}

/// A component present in the house when the simulation starts.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub component_type: ComponentType,
    #[validate]
    pub size: Size,
    /// Name of a catalog preset. The first preset for the component type is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation: Option<String>,
}

impl SimulationConfig {
    pub fn from_reader(reader: impl Read) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config
            .validate()
            .map_err(|errors| anyhow!("Invalid simulation config: {errors}"))?;
        for insulation in config.insulation_catalog.all() {
            insulation.validate().map_err(|errors| {
                anyhow!("Invalid insulation '{}': {errors}", insulation.name)
            })?;
        }
        if let Some(id) = config
            .components
            .iter()
            .map(|component| component.id.as_str())
            .duplicates()
            .next()
        {
            bail!("Component id '{id}' is declared more than once");
        }

        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Build the configuration tree of the initial components, in declaration order.
    pub fn build_tree(&self) -> Result<ComponentConfigurationTree, ConfigurationError> {
        self.components
            .iter()
            .try_fold(ComponentConfigurationTree::new(), |tree, component| {
                let insulation = match &component.insulation {
                    Some(name) => self
                        .insulation_catalog
                        .insulation(component.component_type, name)?,
                    None => self.insulation_catalog.default_for(component.component_type)?,
                };
                tree.with_component(
                    component.parent.as_deref(),
                    &component.id,
                    HouseComponentInsulation::new(
                        component.component_type,
                        insulation,
                        component.size,
                    ),
                )
            })
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let component = |id: &str, parent: Option<&str>, component_type, width, height| {
            ComponentConfig {
                id: id.to_string(),
                parent: parent.map(str::to_string),
                component_type,
                size: Size::new(width, height),
                insulation: None,
            }
        };

        Self {
            indoor_temperature: DEFAULT_INDOOR_TEMPERATURE,
            price_per_kwh: DEFAULT_PRICE_PER_KWH,
            number_of_floors: 1,
            window_length: WindowLength::DEFAULT,
            sampling_unit: TimeUnit::Hour,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            layer_topology: LayerTopology::default(),
            insulation_catalog: InsulationCatalog::default(),
            components: vec![
                component("wall1", None, ComponentType::Wall, 10., 2.5),
                component("wall2", None, ComponentType::Wall, 8., 2.5),
                component("window1", Some("wall1"), ComponentType::Window, 1.5, 1.2),
                component("window2", Some("wall2"), ComponentType::Window, 1.2, 1.2),
                component("door1", Some("wall1"), ComponentType::Door, 0.9, 2.),
            ],
        }
    }
}
