use crate::core::units::{TimeUnit, WindowLength};
use crate::errors::IterationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct TemperatureSample {
    #[serde(rename = "time")]
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Period {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub duration_hours: f64,
}

/// One simulation step's worth of consecutive samples.
#[derive(Clone, Debug, PartialEq)]
pub struct SlidingWindow {
    pub index: usize,
    /// Arithmetic mean of the samples, rounded to the nearest degree. Halves round up.
    pub mean: f64,
    pub samples: Vec<f64>,
    pub period: Period,
    /// Number of samples in this window. Only the last window may be short.
    pub size: usize,
    /// Number of windows the whole input splits into.
    pub total_count: usize,
}

#[derive(Clone, Debug)]
pub struct SlidingWindowIterator {
    samples: Arc<[TemperatureSample]>,
    sampling_unit: TimeUnit,
    window_samples: usize,
    cursor: usize,
    current_index: usize,
}

impl SlidingWindowIterator {
    pub fn new(
        samples: impl Into<Arc<[TemperatureSample]>>,
        sampling_unit: TimeUnit,
        window_length: Option<WindowLength>,
    ) -> Self {
        let window_samples = window_length
            .unwrap_or_default()
            .sample_count(sampling_unit);

        Self {
            samples: samples.into(),
            sampling_unit,
            window_samples,
            cursor: 0,
            current_index: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.samples.len()
    }

    pub fn get_next(&mut self) -> Result<SlidingWindow, IterationError> {
        if !self.has_more() {
            return Err(IterationError);
        }

        let start = self.cursor;
        let end = (start + self.window_samples).min(self.samples.len());
        let slice = &self.samples[start..end];
        let temperatures: Vec<f64> = slice.iter().map(|sample| sample.temperature).collect();
        let mean = (temperatures.iter().sum::<f64>() / temperatures.len() as f64 + 0.5).floor();

        let window = SlidingWindow {
            index: self.current_index,
            mean,
            period: Period {
                from: slice[0].timestamp,
                to: slice[slice.len() - 1].timestamp,
                duration_hours: slice.len() as f64 * self.sampling_unit.hours(),
            },
            size: temperatures.len(),
            samples: temperatures,
            total_count: self.total_windows(),
        };

        self.cursor = end;
        self.current_index += 1;
        if !self.has_more() {
            debug!(windows = self.current_index, "temperature samples exhausted");
        }

        Ok(window)
    }

    pub fn reset(&mut self) {
        self.seek(0);
    }

    /// Move so that the next window produced is the one at `index`. Past the end, the
    /// iterator is exhausted.
    pub fn seek(&mut self, index: usize) {
        self.current_index = index.min(self.total_windows());
        self.cursor = (self.current_index * self.window_samples).min(self.samples.len());
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn sampling_unit(&self) -> TimeUnit {
        self.sampling_unit
    }

    pub fn total_windows(&self) -> usize {
        self.samples.len().div_ceil(self.window_samples)
    }

    pub fn remaining_windows(&self) -> usize {
        (self.samples.len() - self.cursor).div_ceil(self.window_samples)
    }

    /// Share of the input consumed so far, between 0 and 1. An empty input counts as done.
    pub fn progress(&self) -> f64 {
        if self.samples.is_empty() {
            return 1.;
        }
        self.cursor as f64 / self.samples.len() as f64
    }

    pub fn total_hours(&self) -> f64 {
        self.samples.len() as f64 * self.sampling_unit.hours()
    }
}

impl Iterator for SlidingWindowIterator {
    type Item = SlidingWindow;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_next().ok()
    }
}
