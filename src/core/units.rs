use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use strum::{Display, EnumIter, EnumString};

pub const WATTS_PER_KILOWATT: u32 = 1_000;
pub const WATTS_PER_MEGAWATT: u32 = 1_000_000;
pub const MINUTES_PER_HOUR: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_WEEK: u32 = 7;

/// Interval between two raw temperature samples, or the unit of a window length.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, EnumString, Eq, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeUnit {
    Minute,
    #[default]
    Hour,
    Day,
    Week,
}

impl TimeUnit {
    pub fn hours(&self) -> f64 {
        match self {
            TimeUnit::Minute => 1. / MINUTES_PER_HOUR as f64,
            TimeUnit::Hour => 1.,
            TimeUnit::Day => HOURS_PER_DAY as f64,
            TimeUnit::Week => (HOURS_PER_DAY * DAYS_PER_WEEK) as f64,
        }
    }
}

/// How much simulated time one step of the simulation spans.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct WindowLength {
    #[validate(exclusive_minimum = 0.)]
    pub magnitude: f64,
    pub unit: TimeUnit,
}

impl WindowLength {
    pub const DEFAULT: Self = Self {
        magnitude: 1.,
        unit: TimeUnit::Day,
    };

    pub fn new(magnitude: f64, unit: TimeUnit) -> Self {
        Self { magnitude, unit }
    }

    pub fn hours(&self) -> f64 {
        self.magnitude * self.unit.hours()
    }

    /// Number of raw samples taken at `sampling_unit` intervals that make up one window.
    ///
    /// A window shorter than one sampling interval still consumes exactly one sample.
    pub fn sample_count(&self, sampling_unit: TimeUnit) -> usize {
        let samples = (self.hours() / sampling_unit.hours()).round();
        if samples.is_finite() && samples >= 1. {
            samples as usize
        } else {
            1
        }
    }
}

impl Default for WindowLength {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub(crate) fn watt_hours_to_kilowatt_hours(watt_hours: f64) -> f64 {
    watt_hours / WATTS_PER_KILOWATT as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::str::FromStr;

    #[rstest]
    #[case(TimeUnit::Minute, 1. / 60.)]
    #[case(TimeUnit::Hour, 1.)]
    #[case(TimeUnit::Day, 24.)]
    #[case(TimeUnit::Week, 168.)]
    fn should_convert_time_units_to_hours(#[case] unit: TimeUnit, #[case] expected: f64) {
        assert_eq!(unit.hours(), expected);
    }

    #[rstest]
    fn should_parse_time_unit_from_lowercase_name() {
        assert_eq!(TimeUnit::from_str("day").unwrap(), TimeUnit::Day);
        assert_eq!(TimeUnit::Week.to_string(), "week");
    }

    #[rstest]
    #[case(WindowLength::new(1., TimeUnit::Day), TimeUnit::Hour, 24)]
    #[case(WindowLength::new(2., TimeUnit::Week), TimeUnit::Day, 14)]
    #[case(WindowLength::new(30., TimeUnit::Minute), TimeUnit::Hour, 1)]
    #[case(WindowLength::new(1., TimeUnit::Hour), TimeUnit::Day, 1)]
    #[case(WindowLength::new(3., TimeUnit::Hour), TimeUnit::Hour, 3)]
    fn should_convert_window_length_to_sample_count(
        #[case] window: WindowLength,
        #[case] sampling_unit: TimeUnit,
        #[case] expected: usize,
    ) {
        assert_eq!(window.sample_count(sampling_unit), expected);
    }

    #[rstest]
    fn should_default_to_a_one_day_window() {
        assert_eq!(WindowLength::default(), WindowLength::new(1., TimeUnit::Day));
        assert_eq!(WindowLength::default().hours(), 24.);
    }
}
