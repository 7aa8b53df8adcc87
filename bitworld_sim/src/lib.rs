//! bitworld batch driver
//!
//! Everything around the engine that a batch of runs needs:
//! - **Grids**: seeds × η × λ × endowment (or counterfactual scenario)
//! - **Pool**: worker threads fed from a bounded task queue
//! - **Export**: one CSV per run, written atomically, plus a JSON summary
//!
//! The engine in `bitworld_core` knows nothing about files or threads; this
//! crate invokes it once per task.
//!
//! # Usage
//!
//! ```ignore
//! use bitworld_sim::{run_batch, BatchSettings, CsvExporter};
//! use std::sync::Arc;
//!
//! let settings = BatchSettings::load("batch.toml")?;
//! let sink = Arc::new(CsvExporter::new(&settings.output_dir)?);
//! let reports = run_batch(settings.grid().tasks(), &settings.pool_config(), sink)?;
//! ```

mod error;
mod exporter;
mod grid;
mod pool;
mod settings;
pub mod scenarios;

pub use error::DriverError;
pub use exporter::{
    sentinel_generation, BatchSummary, CsvExporter, RunSink, RunSummary, SENTINEL_GENERATION,
};
pub use grid::{seed_gen, ParameterGrid, RunTask, DEFAULT_RATES};
pub use pool::{run_batch, PoolConfig, RunReport, WorkerPool};
pub use settings::{BatchSettings, SEED_RANGE};
