// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends tracked scalars to a long-format CSV file: one row
// per (step, metric) pair, so new metric names never change
// the header.
//
// Example CSV output:
//   step,name,value
//   0,num_parameters,124440576.000000
//   0,loss,4.812300
//   100,loss,2.104500
//   100,norm/wte,461.220000
//
// How to read the metrics:
//   - loss should trend down within the first epoch
//   - norm/* jumping by orders of magnitude means the learning
//     rate is too high

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of the metrics CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub step:  usize,
    pub name:  String,
    pub value: f64,
}

impl MetricRecord {
    pub fn new(step: usize, name: impl Into<String>, value: f64) -> Self {
        Self { step, name: name.into(), value }
    }

    /// Parse one CSV row written by [`MetricsLogger::log`].
    pub fn from_csv_row(row: &str) -> Option<Self> {
        let mut parts = row.splitn(3, ',');
        let step = parts.next()?.parse().ok()?;
        let name = parts.next()?.to_string();
        let value = parts.next()?.parse().ok()?;
        Some(Self { step, name, value })
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "step,name,value")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, records: &[MetricRecord]) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        for m in records {
            writeln!(f, "{},{},{:.6}", m.step, m.name, m.value)?;
        }
        Ok(())
    }

    /// Read every row back.
    pub fn read_all(&self) -> Result<Vec<MetricRecord>> {
        let text = fs::read_to_string(&self.csv_path)?;
        Ok(text.lines().skip(1).filter_map(MetricRecord::from_csv_row).collect())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
