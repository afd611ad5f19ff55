use crate::core::house_component::ComponentType;
use thiserror::Error;

/// Top-level error for operations exposed to a host through the simulation controller.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid house configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Heat loss could not be calculated: {0}")]
    Physics(#[from] PhysicsError),
    #[error("Temperature iteration failed: {0}")]
    Iteration(#[from] IterationError),
    #[error("Simulation history rejected the action: {0}")]
    History(#[from] HistoryError),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Component '{component_id}' cannot be its own parent")]
    SelfParent { component_id: String },
    #[error("Component '{component_id}' already belongs to '{existing}' and cannot be moved to '{requested}'")]
    ParentConflict {
        component_id: String,
        existing: String,
        requested: String,
    },
    #[error("No component with id '{0}' is registered")]
    ComponentNotFound(String),
    #[error("Component '{component_id}' resolved to a non-positive area of {area} m²")]
    InvalidArea { component_id: String, area: f64 },
    #[error("No insulation named '{name}' is available for {component_type}")]
    UnknownInsulation {
        component_type: ComponentType,
        name: String,
    },
    #[error("No material named '{name}' is used by any {component_type}")]
    UnknownMaterial {
        component_type: ComponentType,
        name: String,
    },
    #[error("Insulation name must not be empty")]
    EmptyInsulationName,
    #[error("Component '{0}' must be built from at least one material")]
    EmptyMaterialStack(String),
}

#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum PhysicsError {
    #[error("Thermal conductivity must be positive, got {0} W/(m.K)")]
    NonPositiveConductivity(f64),
    #[error("Material thickness must be positive, got {0} m")]
    NonPositiveThickness(f64),
    #[error("Electricity price must be positive, got {0} per kWh")]
    NonPositivePrice(f64),
    #[error("Energy consumption cannot be negative, got {0} kWh")]
    NegativeEnergy(f64),
}

/// An error representing a request for another window from an exhausted iterator.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("No temperature samples are left to iterate")]
pub struct IterationError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum HistoryError {
    #[error("Cannot rewind to negative index {0}")]
    NegativeIndex(isize),
    #[error("A simulation history needs at least one snapshot")]
    EmptyHistory,
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}
