//! Run output: one CSV per run plus a JSON summary of the batch.

use bitworld_core::{GenerationRecord, RunOutcome, SimulationStatus};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::DriverError;
use crate::grid::RunTask;
use crate::scenarios::ScenarioId;

/// Generation index the analysis layer reports for runs that hit the
/// complexity limit.
pub const SENTINEL_GENERATION: u64 = 9999;

/// Presentation transform applied by consumers, never by the engine:
/// a record at or above the complexity limit is reported as generation 9999.
pub fn sentinel_generation(record: &GenerationRecord, limit: usize) -> u64 {
    if record.tech_complexity >= limit {
        SENTINEL_GENERATION
    } else {
        record.generation
    }
}

/// Destination for finished runs. Implementations must be safe to call
/// from several workers at once for distinct tasks.
pub trait RunSink: Send + Sync {
    /// Persists one run, returning where it went (if anywhere).
    fn commit(&self, task: &RunTask, outcome: &RunOutcome) -> Result<Option<PathBuf>, DriverError>;
}

/// Writes each run to `<dir>/<file_stem>.csv`.
///
/// Rows go to a temporary file that is renamed once complete, so a reader
/// never sees a half-written run.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    /// Creates the exporter, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DriverError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output path of a task.
    pub fn path_for(&self, task: &RunTask) -> PathBuf {
        self.dir.join(format!("{}.csv", task.file_stem()))
    }

    /// Writes a header and one row per record.
    ///
    /// Counterfactual runs get two extra columns, `scenario` and
    /// `initial_resource`.
    pub fn write_records<W: Write>(
        writer: &mut W,
        records: &[GenerationRecord],
        scenario: Option<ScenarioId>,
    ) -> io::Result<()> {
        let mut header = GenerationRecord::COLUMNS.join(",");
        if scenario.is_some() {
            header.push_str(",scenario,initial_resource");
        }
        writeln!(writer, "{}", header)?;

        for r in records {
            write!(
                writer,
                "{},{},{},{},{},{},{},{},{}",
                r.seed,
                r.eta,
                r.lambda,
                r.generation,
                r.tech_complexity,
                r.space_complexity,
                r.effectiveness,
                r.available_resources,
                r.resource_store
            )?;
            match scenario {
                Some(s) => writeln!(writer, ",{},{}", s.name(), s.initial_resource())?,
                None => writeln!(writer)?,
            }
        }
        Ok(())
    }
}

impl RunSink for CsvExporter {
    fn commit(&self, task: &RunTask, outcome: &RunOutcome) -> Result<Option<PathBuf>, DriverError> {
        // partial runs are dropped
        if outcome.status == SimulationStatus::Cancelled {
            return Ok(None);
        }

        let path = self.path_for(task);
        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            Self::write_records(&mut writer, &outcome.records, task.scenario)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(Some(path))
    }
}

/// Final numbers of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub index: usize,
    pub seed: u64,
    pub eta: f64,
    pub lambda: f64,
    pub initial_endowment: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioId>,
    pub status: SimulationStatus,
    pub generations: u64,
    pub tech_complexity: usize,
    pub space_complexity: usize,
    pub effectiveness: f64,
    pub resource_store: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(task: &RunTask, outcome: &RunOutcome, output: Option<PathBuf>) -> Self {
        let last = outcome.final_record();
        Self {
            index: task.index,
            seed: task.config.seed,
            eta: task.config.eta,
            lambda: task.config.lambda,
            initial_endowment: task.config.initial_endowment,
            scenario: task.scenario,
            status: outcome.status,
            generations: outcome.final_generation(),
            tech_complexity: last.map_or(0, |r| r.tech_complexity),
            space_complexity: last.map_or(0, |r| r.space_complexity),
            effectiveness: last.map_or(0.0, |r| r.effectiveness),
            resource_store: last.map_or(task.config.initial_endowment, |r| r.resource_store),
            output,
        }
    }
}

/// Complete batch export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub failed: usize,

    /// Successful (and cancelled) runs in task order
    pub runs: Vec<RunSummary>,

    /// One message per failed task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl BatchSummary {
    /// Adds a finished run.
    pub fn add_run(&mut self, run: RunSummary) {
        self.total += 1;
        if run.status == SimulationStatus::Cancelled {
            self.cancelled += 1;
        } else {
            self.completed += 1;
        }
        self.runs.push(run);
    }

    /// Adds a failed task.
    pub fn add_failure(&mut self, task: &RunTask, error: &DriverError) {
        self.total += 1;
        self.failed += 1;
        self.errors.push(format!("task {} (seed={}): {}", task.index, task.config.seed, error));
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), DriverError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
