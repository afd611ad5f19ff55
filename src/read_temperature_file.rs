use crate::temperature_iterator::TemperatureSample;
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::ReaderBuilder as CsvReaderBuilder;
use std::io::Read;

const COLUMN_TIME: &str = "time";
const COLUMN_TEMPERATURE_PREFIX: &str = "temperature"; // e.g. "temperature" or "temperature_2m (°C)"

const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Read `time,temperature` rows (header row required) into an ordered sample sequence.
pub fn temperature_data_to_vec(file: impl Read) -> anyhow::Result<Vec<TemperatureSample>> {
    let mut reader = CsvReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .context("Could not read the header row of the temperature file")?
        .clone();
    let time_column = headers
        .iter()
        .position(|header| header == COLUMN_TIME)
        .ok_or_else(|| anyhow!("Temperature file has no '{COLUMN_TIME}' column"))?;
    let temperature_column = headers
        .iter()
        .position(|header| header.starts_with(COLUMN_TEMPERATURE_PREFIX))
        .ok_or_else(|| anyhow!("Temperature file has no '{COLUMN_TEMPERATURE_PREFIX}' column"))?;

    let mut samples = vec![];
    for (i, result) in reader.records().enumerate() {
        // header is line 1
        let line = i + 2;
        let record = result.with_context(|| format!("Malformed row on line {line}"))?;
        let (Some(time), Some(temperature)) =
            (record.get(time_column), record.get(temperature_column))
        else {
            bail!("Missing time or temperature on line {line}");
        };
        samples.push(TemperatureSample {
            timestamp: parse_timestamp(time)
                .with_context(|| format!("Invalid timestamp '{time}' on line {line}"))?,
            temperature: temperature
                .parse()
                .with_context(|| format!("Invalid temperature '{temperature}' on line {line}"))?,
        });
    }

    Ok(samples)
}

fn parse_timestamp(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(timestamp.and_utc());
        }
    }
    bail!("not an ISO-8601 timestamp")
}
