//! Measurement sources
//!
//! - [`CsvMeasurementSource`]: named columns of a CSV file, loaded up front
//! - [`VecSource`]: in-memory rows, for tests and embedding

use crate::config::SourceConfig;
use argus_core::{ChannelSpec, TickIndex, Timestamp};
use argus_ports::{Measurement, MeasurementSource, SourceError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// CSV file with a header row
///
/// Columns are resolved by header name. A blank or non-numeric cell repeats
/// the channel's previous value; a gap on the first row is an error.
#[derive(Debug, Clone)]
pub struct CsvMeasurementSource {
    name: String,
    channels: Vec<ChannelSpec>,
    rows: Vec<Measurement>,
}

impl CsvMeasurementSource {
    pub fn open(config: &SourceConfig) -> Result<Self, SourceError> {
        let file = File::open(&config.path).map_err(|source| SourceError::Io {
            path: config.path.display().to_string(),
            source,
        })?;
        let source = Self::from_reader(BufReader::new(file), config)?;
        log::info!(
            "[source] loaded {} rows x {} channels from {}",
            source.rows.len(),
            source.channels.len(),
            config.path.display()
        );
        Ok(source)
    }

    /// Parse CSV text laid out as described by `config`
    pub fn parse(content: &str, config: &SourceConfig) -> Result<Self, SourceError> {
        Self::from_reader(content.as_bytes(), config)
    }

    fn from_reader<R: Read>(input: R, config: &SourceConfig) -> Result<Self, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers = reader.headers().map_err(csv_error)?.clone();
        let column_of = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| SourceError::MissingColumn(name.to_string()))
        };
        let value_columns = config
            .channels
            .iter()
            .map(|c| column_of(&c.column))
            .collect::<Result<Vec<_>, _>>()?;
        let timestamp_column = config
            .timestamp_column
            .as_deref()
            .map(column_of)
            .transpose()?;

        let mut rows: Vec<Measurement> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            let field = |col: usize| record.get(col).unwrap_or_default();

            let timestamp = match timestamp_column {
                Some(col) => Some(parse_timestamp(field(col)).ok_or_else(|| {
                    SourceError::Parse {
                        line,
                        message: format!("unrecognised timestamp '{}'", field(col)),
                    }
                })?),
                None => None,
            };

            let mut values = Vec::with_capacity(value_columns.len());
            for (c, &col) in value_columns.iter().enumerate() {
                let value = match field(col).parse::<f64>() {
                    Ok(v) if v.is_finite() => v,
                    _ => match rows.last() {
                        Some(previous) => previous.values[c],
                        None => {
                            return Err(SourceError::Parse {
                                line,
                                message: format!(
                                    "no value for '{}' and nothing to carry forward",
                                    config.channels[c].column
                                ),
                            });
                        }
                    },
                };
                values.push(value);
            }
            rows.push(Measurement { timestamp, values });
        }

        let channels = config
            .channels
            .iter()
            .map(|c| {
                let spec = ChannelSpec::new(&c.name);
                match &c.unit {
                    Some(unit) => spec.with_unit(unit),
                    None => spec,
                }
            })
            .collect();

        Ok(Self {
            name: file_name(&config.path),
            channels,
            rows,
        })
    }
}

fn csv_error(err: csv::Error) -> SourceError {
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => SourceError::WidthMismatch {
            expected: *expected_len as usize,
            actual: *len as usize,
        },
        _ => SourceError::Parse {
            line: err.position().map_or(0, |p| p.line() as usize),
            message: err.to_string(),
        },
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string())
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[ ±HH:MM]` and bare dates
fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %:z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

impl MeasurementSource for CsvMeasurementSource {
    fn channels(&self) -> &[ChannelSpec] {
        &self.channels
    }

    fn next(&self, idx: TickIndex) -> Result<Measurement, SourceError> {
        self.rows
            .get(idx)
            .cloned()
            .ok_or(SourceError::EndOfData { index: idx })
    }

    fn len(&self) -> Option<usize> {
        Some(self.rows.len())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// In-memory rows
#[derive(Debug, Clone)]
pub struct VecSource {
    channels: Vec<ChannelSpec>,
    rows: Vec<Measurement>,
}

impl VecSource {
    pub fn new(channels: Vec<ChannelSpec>, rows: Vec<Vec<f64>>) -> Self {
        Self {
            channels,
            rows: rows.into_iter().map(Measurement::new).collect(),
        }
    }

    pub fn with_measurements(channels: Vec<ChannelSpec>, rows: Vec<Measurement>) -> Self {
        Self { channels, rows }
    }
}

impl MeasurementSource for VecSource {
    fn channels(&self) -> &[ChannelSpec] {
        &self.channels
    }

    fn next(&self, idx: TickIndex) -> Result<Measurement, SourceError> {
        self.rows
            .get(idx)
            .cloned()
            .ok_or(SourceError::EndOfData { index: idx })
    }

    fn len(&self) -> Option<usize> {
        Some(self.rows.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
