use crate::core::material::{Insulation, Material};
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use strum::{Display, EnumIter, EnumString};

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
pub enum ComponentType {
    Wall,
    Window,
    Door,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Size {
    #[validate(exclusive_minimum = 0.)]
    pub width: f64, // m
    #[validate(exclusive_minimum = 0.)]
    pub height: f64, // m
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// One placed component instance (e.g. "wall1") with the insulation it is built from.
///
/// `actual_area` is only meaningful on values handed out by the configuration tree,
/// which resolves it against the component's children.
#[derive(Clone, Debug, PartialEq)]
pub struct HouseComponentInsulation {
    pub insulation_name: String,
    pub component_type: ComponentType,
    pub building_materials: Vec<Material>,
    pub size: Size,
    pub actual_area: f64,
}

impl HouseComponentInsulation {
    pub fn new(component_type: ComponentType, insulation: &Insulation, size: Size) -> Self {
        Self {
            insulation_name: insulation.name.clone(),
            component_type,
            building_materials: insulation.building_materials.clone(),
            size,
            actual_area: size.area(),
        }
    }

    pub fn raw_area(&self) -> f64 {
        self.size.area()
    }

    pub(crate) fn with_insulation(&self, insulation: &Insulation) -> Self {
        Self {
            insulation_name: insulation.name.clone(),
            building_materials: insulation.building_materials.clone(),
            ..self.clone()
        }
    }
}
