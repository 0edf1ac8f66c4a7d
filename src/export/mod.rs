//! Tabular snapshot export.
//!
//! Both CSV writers share one row layout, one row per body slot:
//!
//! ```text
//! iteration,body_id,name,mass,radius,x,y,z,vx,vy,vz,active,kinetic_energy,total_system_energy,energy_error
//! ```
//!
//! [`CurrentStateCsv`] rewrites its file on every snapshot; [`HistoryCsv`]
//! appends every `interval`-th iteration. [`HistoryJsonLines`] writes one
//! serialized snapshot per line instead.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::OutputConfig;
use crate::engine::{Snapshot, SnapshotSink};
use crate::error::{SimError, SimResult};

/// Column header shared by the current-state and history files.
pub const CSV_HEADER: &str = "iteration,body_id,name,mass,radius,x,y,z,vx,vy,vz,active,kinetic_energy,total_system_energy,energy_error";

/// History file layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryFormat {
    /// One row per body per recorded iteration.
    #[default]
    Csv,
    /// One JSON snapshot per recorded iteration.
    JsonLines,
}

/// Write the rows of `snapshot` (without header).
///
/// # Errors
///
/// Returns error if the writer fails.
pub fn write_csv_rows<W: Write>(writer: &mut W, snapshot: &Snapshot) -> io::Result<()> {
    let energy = &snapshot.energy;
    for body in &snapshot.bodies {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            snapshot.iteration,
            body.index,
            csv_field(&body.name),
            body.mass,
            body.radius,
            body.position.x,
            body.position.y,
            body.position.z,
            body.velocity.x,
            body.velocity.y,
            body.velocity.z,
            u8::from(body.active),
            body.kinetic_energy,
            energy.total,
            energy.relative_error,
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Latest snapshot as a complete CSV file, replaced on every record.
///
/// The file is written beside the target and renamed over it, so a reader
/// never sees a partial table.
#[derive(Debug, Clone)]
pub struct CurrentStateCsv {
    path: PathBuf,
}

impl CurrentStateCsv {
    /// Write to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write(&self, snapshot: &Snapshot) -> io::Result<()> {
        let staging = self.staging_path();
        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            writeln!(writer, "{CSV_HEADER}")?;
            write_csv_rows(&mut writer, snapshot)?;
            writer.flush()?;
        }
        fs::rename(&staging, &self.path)
    }
}

impl SnapshotSink for CurrentStateCsv {
    fn record(&mut self, snapshot: &Snapshot) -> SimResult<()> {
        self.write(snapshot)
            .map_err(|source| SimError::export(&self.path, source))
    }
}

/// Appending CSV history.
///
/// The file is truncated and given a header on the first record; after that
/// rows are appended for iteration zero and every `interval`-th iteration.
#[derive(Debug)]
pub struct HistoryCsv {
    path: PathBuf,
    interval: u64,
    writer: Option<BufWriter<File>>,
}

impl HistoryCsv {
    /// Record every `interval`-th iteration into `path`. Zero is treated as one.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, interval: u64) -> Self {
        Self {
            path: path.into(),
            interval: interval.max(1),
            writer: None,
        }
    }

    /// Target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let writer = match &mut self.writer {
            Some(writer) => writer,
            slot @ None => {
                let mut writer = BufWriter::new(File::create(&self.path)?);
                writeln!(writer, "{CSV_HEADER}")?;
                slot.insert(writer)
            }
        };
        write_csv_rows(writer, snapshot)
    }
}

impl SnapshotSink for HistoryCsv {
    fn record(&mut self, snapshot: &Snapshot) -> SimResult<()> {
        if snapshot.iteration % self.interval != 0 {
            return Ok(());
        }
        self.append(snapshot)
            .map_err(|source| SimError::export(&self.path, source))
    }

    fn finish(&mut self) -> SimResult<()> {
        if let Some(writer) = &mut self.writer {
            writer
                .flush()
                .map_err(|source| SimError::export(&self.path, source))?;
        }
        Ok(())
    }
}

/// History as JSON Lines: one serialized [`Snapshot`] per recorded iteration.
#[derive(Debug)]
pub struct HistoryJsonLines {
    path: PathBuf,
    interval: u64,
    writer: Option<BufWriter<File>>,
}

impl HistoryJsonLines {
    /// Record every `interval`-th iteration into `path`. Zero is treated as one.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, interval: u64) -> Self {
        Self {
            path: path.into(),
            interval: interval.max(1),
            writer: None,
        }
    }

    fn append(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let writer = match &mut self.writer {
            Some(writer) => writer,
            slot @ None => slot.insert(BufWriter::new(File::create(&self.path)?)),
        };
        serde_json::to_writer(&mut *writer, snapshot)?;
        writeln!(writer)
    }
}

impl SnapshotSink for HistoryJsonLines {
    fn record(&mut self, snapshot: &Snapshot) -> SimResult<()> {
        if snapshot.iteration % self.interval != 0 {
            return Ok(());
        }
        self.append(snapshot)
            .map_err(|source| SimError::export(&self.path, source))
    }

    fn finish(&mut self) -> SimResult<()> {
        if let Some(writer) = &mut self.writer {
            writer
                .flush()
                .map_err(|source| SimError::export(&self.path, source))?;
        }
        Ok(())
    }
}

/// Sinks for the configured outputs: current state first, then history.
#[must_use]
pub fn sinks_for(output: &OutputConfig) -> Vec<Box<dyn SnapshotSink + Send>> {
    let history: Box<dyn SnapshotSink + Send> = match output.history_format {
        HistoryFormat::Csv => Box::new(HistoryCsv::new(&output.history, output.history_interval)),
        HistoryFormat::JsonLines => Box::new(HistoryJsonLines::new(
            &output.history,
            output.history_interval,
        )),
    };
    vec![Box::new(CurrentStateCsv::new(&output.current_state)), history]
}
