use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Key of a sizing lookup: the science tag plus the observation's shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingQuery<'a> {
    pub hpso: &'a str,
    pub baseline: f64,
    pub channels: u32,
    pub demand: u32,
}

impl SizingQuery<'_> {
    fn lookup_error(&self, item: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::LookupError {
            hpso: self.hpso.to_string(),
            baseline: self.baseline,
            channels: self.channels,
            demand: self.demand,
            item: item.into(),
            reason: reason.into(),
        }
    }
}

/// Names of the key columns of one table layout.
#[derive(Debug, Clone, Copy)]
struct KeyColumns {
    hpso: &'static str,
    pipeline: Option<&'static str>,
    baseline: &'static str,
    stations: &'static str,
    channels: &'static str,
}

const COMPONENT_COLUMNS: KeyColumns =
    KeyColumns { hpso: "hpso", pipeline: Some("Pipeline"), baseline: "Baseline", stations: "Antenna stations", channels: "Channels" };

const TOTAL_COLUMNS: KeyColumns = KeyColumns { hpso: "HPSO", pipeline: None, baseline: "Baseline", stations: "Stations", channels: "Channels" };

#[derive(Debug, Clone)]
struct SizingRow {
    hpso: String,
    pipeline: Option<String>,
    baseline: f64,
    stations: u32,
    channels: u32,
    values: HashMap<String, f64>,
}

/// Rows of a sizing CSV. Every non-key column holding a number becomes a rate entry;
/// the unnamed pandas index column and textual columns are dropped.
#[derive(Debug, Clone)]
struct SizingTable {
    rows: Vec<SizingRow>,
}

impl SizingTable {
    fn from_reader<R: io::Read>(reader: R, columns: KeyColumns) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let position = |name: &str| -> Result<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| Error::configuration(format!("Sizing table is missing the '{}' column", name)))
        };
        let hpso_idx = position(columns.hpso)?;
        let pipeline_idx = columns.pipeline.map(position).transpose()?;
        let baseline_idx = position(columns.baseline)?;
        let stations_idx = position(columns.stations)?;
        let channels_idx = position(columns.channels)?;
        let key_indices = [Some(hpso_idx), pipeline_idx, Some(baseline_idx), Some(stations_idx), Some(channels_idx)];

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("");
            let number = |idx: usize| -> Result<f64> {
                field(idx).parse::<f64>().map_err(|_| {
                    Error::configuration(format!("Sizing table row {}: '{}' is not numeric in column '{}'", line + 1, field(idx), &headers[idx]))
                })
            };

            let mut values = HashMap::new();
            for (idx, header) in headers.iter().enumerate() {
                if header.is_empty() || key_indices.contains(&Some(idx)) {
                    continue;
                }
                if let Ok(value) = field(idx).parse::<f64>() {
                    values.insert(header.to_string(), value);
                }
            }

            rows.push(SizingRow {
                hpso: field(hpso_idx).to_string(),
                pipeline: pipeline_idx.map(|idx| field(idx).to_string()),
                baseline: number(baseline_idx)?,
                stations: number(stations_idx)?.round() as u32,
                channels: number(channels_idx)?.round() as u32,
                values,
            });
        }

        Ok(SizingTable { rows })
    }

    /// Rows of the query's tag at the baseline closest to the requested one, with exactly
    /// matching channels and stations.
    fn matching_rows<'a>(&'a self, query: &SizingQuery, item: &str) -> Result<Vec<&'a SizingRow>> {
        let hpso_rows: Vec<&SizingRow> = self.rows.iter().filter(|row| row.hpso == query.hpso).collect();

        let baseline = hpso_rows
            .iter()
            .map(|row| row.baseline)
            .min_by(|a, b| (a - query.baseline).abs().total_cmp(&(b - query.baseline).abs()))
            .ok_or_else(|| query.lookup_error(item, "science tag not present in sizing table"))?;

        if baseline != query.baseline {
            log::debug!("No sizing rows for {} at baseline {}, using closest baseline {}", query.hpso, query.baseline, baseline);
        }

        let rows: Vec<&SizingRow> = hpso_rows
            .into_iter()
            .filter(|row| row.baseline == baseline && row.channels == query.channels && row.stations == query.demand)
            .collect();

        if rows.is_empty() {
            return Err(query.lookup_error(item, "no row for this combination of baseline, channels and stations"));
        }
        Ok(rows)
    }
}

/// Per-component compute rates (PFLOP/s) and visibility rates (Mvis/s) for each
/// (hpso, pipeline, baseline, stations, channels). Data rates live in rows whose
/// pipeline is `<pipeline>_data`.
#[derive(Debug, Clone)]
pub struct ComponentSizing {
    table: SizingTable,
}

impl ComponentSizing {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        Ok(ComponentSizing { table: SizingTable::from_reader(reader, COMPONENT_COLUMNS)? })
    }

    pub fn has_pipeline(&self, pipeline: &str) -> bool {
        self.table.rows.iter().any(|row| row.pipeline.as_deref() == Some(pipeline))
    }

    /// Compute rate of `component` in `pipeline`, in PFLOP/s.
    pub fn compute_rate(&self, query: &SizingQuery, pipeline: &str, component: &str) -> Result<f64> {
        self.rate(query, pipeline, component)
    }

    /// Data rate of `component` in `pipeline`, in Mvis/s.
    pub fn data_rate(&self, query: &SizingQuery, pipeline: &str, component: &str) -> Result<f64> {
        self.rate(query, &format!("{}_data", pipeline), component)
    }

    fn rate(&self, query: &SizingQuery, pipeline: &str, component: &str) -> Result<f64> {
        let item = format!("{}/{}", pipeline, component);
        if !self.has_pipeline(pipeline) {
            return Err(query.lookup_error(item, format!("pipeline '{}' not present in sizing table", pipeline)));
        }

        let rows = self.table.matching_rows(query, &item)?;
        let row = rows
            .into_iter()
            .find(|row| row.pipeline.as_deref() == Some(pipeline))
            .ok_or_else(|| query.lookup_error(item.as_str(), format!("observation does not require pipeline '{}'", pipeline)))?;

        row.values.get(component).copied().ok_or_else(|| query.lookup_error(item.as_str(), "no numeric column for component"))
    }
}

/// Whole-system sizing per (HPSO, baseline, stations, channels), e.g. `Ingest [Pflop/s]`.
#[derive(Debug, Clone)]
pub struct TotalSizing {
    table: SizingTable,
}

impl TotalSizing {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        Ok(TotalSizing { table: SizingTable::from_reader(reader, TOTAL_COLUMNS)? })
    }

    pub fn rate(&self, query: &SizingQuery, column: &str) -> Result<f64> {
        let rows = self.table.matching_rows(query, column)?;
        rows[0].values.get(column).copied().ok_or_else(|| query.lookup_error(column, "column not present in total sizing table"))
    }
}
