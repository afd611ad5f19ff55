use crate::core::house_component::ComponentType;
use crate::errors::ConfigurationError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::sync::LazyLock;

/// This module contains data on building materials, and the insulation presets
/// that stack them up for each kind of house component.

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Material {
    name: String,
    #[validate(exclusive_minimum = 0.)]
    thermal_conductivity: f64, // W/(m.K)
    #[validate(minimum = 0.)]
    price: f64, // currency/m3
    #[validate(exclusive_minimum = 0.)]
    thickness: f64, // m
}

impl Material {
    pub fn new(name: &str, thermal_conductivity: f64, price: f64, thickness: f64) -> Self {
        Self {
            name: name.to_string(),
            thermal_conductivity,
            price,
            thickness,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thermal_conductivity(&self) -> f64 {
        self.thermal_conductivity
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Return a copy of this material with the price and/or thickness overridden.
    /// Name and conductivity always carry over.
    pub fn derive(&self, price: Option<f64>, thickness: Option<f64>) -> Self {
        Self {
            name: self.name.clone(),
            thermal_conductivity: self.thermal_conductivity,
            price: price.unwrap_or(self.price),
            thickness: thickness.unwrap_or(self.thickness),
        }
    }
}

/// An in-place edit of one material layer, addressed by material name.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MaterialUpdate {
    pub name: String,
    pub price: Option<f64>,
    pub thickness: Option<f64>,
}

/// A named preset: the ordered stack of materials a component is built from.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Insulation {
    pub name: String,
    #[validate(min_items = 1)]
    #[validate]
    pub building_materials: Vec<Material>,
}

impl Insulation {
    pub fn new(name: &str, building_materials: Vec<Material>) -> Self {
        Self {
            name: name.to_string(),
            building_materials,
        }
    }
}

/// Insulation presets available for each component type, in presentation order.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InsulationCatalog(IndexMap<ComponentType, Vec<Insulation>>);

impl InsulationCatalog {
    pub fn new(presets: IndexMap<ComponentType, Vec<Insulation>>) -> Self {
        Self(presets)
    }

    pub fn insulation(
        &self,
        component_type: ComponentType,
        name: &str,
    ) -> Result<&Insulation, ConfigurationError> {
        self.presets_for(component_type)
            .iter()
            .find(|insulation| insulation.name == name)
            .ok_or_else(|| ConfigurationError::UnknownInsulation {
                component_type,
                name: name.to_string(),
            })
    }

    pub fn presets_for(&self, component_type: ComponentType) -> &[Insulation] {
        self.0
            .get(&component_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The preset a freshly registered component starts with.
    pub fn default_for(
        &self,
        component_type: ComponentType,
    ) -> Result<&Insulation, ConfigurationError> {
        self.presets_for(component_type).first().ok_or_else(|| {
            ConfigurationError::UnknownInsulation {
                component_type,
                name: String::new(),
            }
        })
    }

    pub(crate) fn all(&self) -> impl Iterator<Item = &Insulation> {
        self.0.values().flatten()
    }
}

impl Default for InsulationCatalog {
    fn default() -> Self {
        DEFAULT_CATALOG.clone()
    }
}

pub static BRICK: LazyLock<Material> = LazyLock::new(|| Material::new("brick", 0.77, 150., 0.2));
pub static MINERAL_WOOL: LazyLock<Material> =
    LazyLock::new(|| Material::new("mineral wool", 0.035, 60., 0.1));
pub static POLYSTYRENE: LazyLock<Material> =
    LazyLock::new(|| Material::new("polystyrene", 0.033, 80., 0.1));
pub static GLASS: LazyLock<Material> = LazyLock::new(|| Material::new("glass", 1., 900., 0.004));
pub static ARGON: LazyLock<Material> = LazyLock::new(|| Material::new("argon", 0.018, 20., 0.016));
pub static WOOD: LazyLock<Material> = LazyLock::new(|| Material::new("wood", 0.13, 500., 0.04));
pub static POLYURETHANE: LazyLock<Material> =
    LazyLock::new(|| Material::new("polyurethane", 0.025, 120., 0.03));

static DEFAULT_CATALOG: LazyLock<InsulationCatalog> = LazyLock::new(|| {
    InsulationCatalog(IndexMap::from([
        (
            ComponentType::Wall,
            vec![
                Insulation::new("brick", vec![BRICK.clone()]),
                Insulation::new(
                    "brick and mineral wool",
                    vec![BRICK.clone(), MINERAL_WOOL.clone()],
                ),
                Insulation::new(
                    "brick and polystyrene",
                    vec![BRICK.clone(), POLYSTYRENE.clone()],
                ),
            ],
        ),
        (
            ComponentType::Window,
            vec![
                Insulation::new("single glazing", vec![GLASS.clone()]),
                Insulation::new(
                    "double glazing",
                    vec![GLASS.clone(), ARGON.clone(), GLASS.clone()],
                ),
                Insulation::new(
                    "triple glazing",
                    vec![
                        GLASS.clone(),
                        ARGON.clone(),
                        GLASS.clone(),
                        ARGON.clone(),
                        GLASS.clone(),
                    ],
                ),
            ],
        ),
        (
            ComponentType::Door,
            vec![
                Insulation::new("wood", vec![WOOD.clone()]),
                Insulation::new(
                    "insulated wood",
                    vec![WOOD.clone(), POLYURETHANE.clone(), WOOD.clone()],
                ),
            ],
        ),
    ]))
});
