use crate::core::material::Material;
use crate::core::units::{TimeUnit, WATTS_PER_KILOWATT, WATTS_PER_MEGAWATT};
use crate::errors::PhysicsError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum::Display as StrumDisplay;

/// Heat-loss constant factor of a single homogeneous layer, in W/K.
pub fn heat_loss_constant_factor(
    thermal_conductivity: f64,
    area: f64,
    thickness: f64,
) -> Result<f64, PhysicsError> {
    if thermal_conductivity <= 0. {
        return Err(PhysicsError::NonPositiveConductivity(thermal_conductivity));
    }
    if thickness <= 0. {
        return Err(PhysicsError::NonPositiveThickness(thickness));
    }

    Ok(thermal_conductivity * area / thickness)
}

/// Instantaneous heat loss in W. Cooling load is not modelled, so an outdoor
/// temperature at or above the indoor one gives zero.
pub fn instantaneous_heat_loss(
    factor: f64,
    indoor_temperature: f64,
    outdoor_temperature: f64,
) -> f64 {
    (factor * (indoor_temperature - outdoor_temperature)).max(0.)
}

/// Energy lost over a run of samples taken at `sampling_unit` intervals, in Wh.
pub fn accumulated_heat_loss(
    outdoor_temperatures: &[f64],
    factor: f64,
    indoor_temperature: f64,
    sampling_unit: TimeUnit,
) -> f64 {
    outdoor_temperatures
        .iter()
        .map(|outdoor| {
            instantaneous_heat_loss(factor, indoor_temperature, *outdoor) * sampling_unit.hours()
        })
        .sum()
}

/// How the layers of a composite component combine into one factor.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerTopology {
    /// Every layer conducts on its own and the per-layer factors add up.
    #[default]
    Independent,
    /// Layers form a series of thermal resistances: A / Σ(d/k).
    Series,
}

pub fn component_heat_loss_factor(
    building_materials: &[Material],
    area: f64,
    topology: LayerTopology,
) -> Result<f64, PhysicsError> {
    match topology {
        LayerTopology::Independent => building_materials.iter().try_fold(0., |total, material| {
            Ok(total
                + heat_loss_constant_factor(
                    material.thermal_conductivity(),
                    area,
                    material.thickness(),
                )?)
        }),
        LayerTopology::Series => {
            let mut resistance = 0.; // m2.K/W
            for material in building_materials {
                // validates the layer the same way as the single-layer formula
                let per_square_metre = heat_loss_constant_factor(
                    material.thermal_conductivity(),
                    1.,
                    material.thickness(),
                )?;
                resistance += 1. / per_square_metre;
            }
            if resistance == 0. {
                return Ok(0.);
            }
            Ok(area / resistance)
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, StrumDisplay)]
pub enum PowerUnit {
    #[strum(serialize = "W")]
    Watt,
    #[strum(serialize = "kW")]
    KiloWatt,
    #[strum(serialize = "MW")]
    MegaWatt,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HeatLossRate {
    pub value: f64,
    pub unit: PowerUnit,
}

impl Display for HeatLossRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Bucket a wattage into W, kW or MW by magnitude.
pub fn format_heat_loss_rate(watts: f64) -> HeatLossRate {
    if watts < WATTS_PER_KILOWATT as f64 {
        HeatLossRate {
            value: watts.round(),
            unit: PowerUnit::Watt,
        }
    } else if watts < WATTS_PER_MEGAWATT as f64 {
        HeatLossRate {
            value: round_to_one_decimal(watts / WATTS_PER_KILOWATT as f64),
            unit: PowerUnit::KiloWatt,
        }
    } else {
        HeatLossRate {
            value: round_to_one_decimal(watts / WATTS_PER_MEGAWATT as f64),
            unit: PowerUnit::MegaWatt,
        }
    }
}

fn round_to_one_decimal(value: f64) -> f64 {
    (value * 10.).round() / 10.
}

/// Unrounded cost of `energy_kwh` at the given price.
pub fn energy_cost(price_per_kwh: f64, energy_kwh: f64) -> Result<f64, PhysicsError> {
    if price_per_kwh <= 0. {
        return Err(PhysicsError::NonPositivePrice(price_per_kwh));
    }
    if energy_kwh < 0. {
        return Err(PhysicsError::NegativeEnergy(energy_kwh));
    }

    Ok(price_per_kwh * energy_kwh)
}

/// Electricity cost rounded to whole currency units.
pub fn electricity_cost(price_per_kwh: f64, energy_kwh: f64) -> Result<f64, PhysicsError> {
    Ok(energy_cost(price_per_kwh, energy_kwh)?.round())
}
