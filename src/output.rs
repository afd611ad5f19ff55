use crate::simulation::history::SimulationHistory;
use anyhow::anyhow;
use csv::WriterBuilder;
use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Writes each location key to its own file in `directory_path`, named by filling
/// `file_template` (e.g. `"{}.csv"`) with the key.
#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }

    fn path_for(&self, location_key: &str) -> anyhow::Result<PathBuf> {
        let file_name = formatx!(&self.file_template, location_key).map_err(|_| {
            anyhow!(
                "Output file template '{}' cannot be filled with '{location_key}'",
                self.file_template
            )
        })?;
        Ok(self.directory_path.join(file_name))
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        Ok(BufWriter::new(File::create(self.path_for(location_key)?)?))
    }
}

impl Output for &FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_location_key(self, location_key)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

pub const HISTORY_REPORT_KEY: &str = "history";

const HISTORY_REPORT_HEADINGS: [&str; 8] = [
    "Step",
    "From",
    "To",
    "Outdoor temp",
    "Indoor temp",
    "Heat loss",
    "Cumulative heat loss",
    "Cumulative cost",
];
const HISTORY_REPORT_UNITS: [&str; 8] = [
    "[count]",
    "[UTC]",
    "[UTC]",
    "[deg C]",
    "[deg C]",
    "[W]",
    "[kWh]",
    "[currency]",
];

/// Write one row per visited snapshot, after a headings row and a units row.
pub fn write_history_report(
    history: &SimulationHistory,
    output: &impl Output,
) -> anyhow::Result<()> {
    if output.is_noop() {
        return Ok(());
    }

    debug!(rows = history.past().len(), "writing history report");
    let writer = output.writer_for_location_key(HISTORY_REPORT_KEY)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(HISTORY_REPORT_HEADINGS)?;
    writer.write_record(HISTORY_REPORT_UNITS)?;

    for (step, snapshot) in history.past().enumerate() {
        let (from, to) = snapshot.period().map_or_else(Default::default, |period| {
            (period.from.to_rfc3339(), period.to.to_rfc3339())
        });
        writer.write_record([
            step.to_string(),
            from,
            to,
            snapshot.outdoor_temperature().value.to_string(),
            snapshot.indoor_temperature().to_string(),
            snapshot.heat_loss().global.to_string(),
            snapshot.cumulative_heat_loss().to_string(),
            snapshot.cumulative_cost().to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::simulation::controller::SimulationController;
    use crate::temperature_iterator::TemperatureSample;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::sync::Arc;

    /// Collects everything written to it, for inspection.
    #[derive(Debug, Default)]
    struct MemoryOutput(Arc<Mutex<Vec<u8>>>);

    struct MemoryWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for MemoryWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Output for MemoryOutput {
        fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
            Ok(MemoryWriter(self.0.clone()))
        }
    }

    #[rstest]
    fn should_write_one_row_per_visited_snapshot() {
        let samples = vec![TemperatureSample {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            temperature: 20.,
        }];
        let controller = SimulationController::new(SimulationConfig::default(), samples).unwrap();
        controller.run_to_end().unwrap();
        let output = MemoryOutput::default();

        write_history_report(&controller.history(), &output).unwrap();

        let written = String::from_utf8(output.0.lock().clone()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Step,From,To,Outdoor temp,Indoor temp,Heat loss,Cumulative heat loss,Cumulative cost"
        );
        assert_eq!(lines[2], "0,,,20,20,0,0,0");
        assert_eq!(
            lines[3],
            "1,2024-01-01T00:00:00+00:00,2024-01-01T00:00:00+00:00,20,20,0,0,0"
        );
    }

    #[rstest]
    fn should_fill_file_template_with_location_key() {
        let output = FileOutput::new(PathBuf::from("out"), "{}.csv".to_string());
        assert_eq!(
            output.path_for("history").unwrap(),
            PathBuf::from("out").join("history.csv")
        );
    }

    #[rstest]
    fn should_skip_writing_to_sink() {
        let controller =
            SimulationController::new(SimulationConfig::default(), Vec::<TemperatureSample>::new())
                .unwrap();
        assert!(write_history_report(&controller.history(), &SinkOutput).is_ok());
    }
}
