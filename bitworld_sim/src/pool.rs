//! Worker pool for batches of independent runs.
//!
//! Tasks go through a bounded queue to a fixed set of named worker threads.
//! Each worker owns the run it is executing outright; the only shared state
//! is the output sink and a cancellation flag checked between generations.

use bitworld_core::SimulationRunner;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

use crate::error::DriverError;
use crate::exporter::{RunSink, RunSummary};
use crate::grid::RunTask;

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Maximum queued tasks
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map_or(1, |n| n.get()),
            queue_capacity: 1024,
        }
    }
}

/// Result of one task.
#[derive(Debug)]
pub struct RunReport {
    pub task: RunTask,
    pub result: Result<RunSummary, DriverError>,
}

/// Runs tasks on worker threads and collects their reports.
pub struct WorkerPool {
    tx: Sender<RunTask>,
    results: Receiver<RunReport>,
    workers: Vec<JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
    /// Every task handed to the queue, to account for lost reports
    submitted: Vec<RunTask>,
}

impl WorkerPool {
    /// Spawns the workers.
    pub fn start(config: &PoolConfig, sink: Arc<dyn RunSink>) -> Result<Self, DriverError> {
        let workers = config.workers.max(1);
        let (tx, rx) = bounded::<RunTask>(config.queue_capacity.max(1));
        let (result_tx, results) = unbounded::<RunReport>();
        let cancel = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx = rx.clone();
            let result_tx = result_tx.clone();
            let sink = Arc::clone(&sink);
            let cancel = Arc::clone(&cancel);
            let handle = thread::Builder::new()
                .name(format!("bitworld-worker-{idx}"))
                .spawn(move || {
                    while let Ok(task) = rx.recv() {
                        let result = panic::catch_unwind(AssertUnwindSafe(|| {
                            execute(&task, sink.as_ref(), &cancel)
                        }))
                        .unwrap_or_else(|_| {
                            error!("Task {} panicked", task.index);
                            Err(DriverError::WorkerPanicked(task.index))
                        });
                        if result_tx.send(RunReport { task, result }).is_err() {
                            break;
                        }
                    }
                })?;
            handles.push(handle);
        }
        debug!("Started {} workers", workers);

        Ok(Self {
            tx,
            results,
            workers: handles,
            cancel,
            submitted: Vec::new(),
        })
    }

    /// Queues a task, blocking while the queue is full.
    pub fn submit(&mut self, task: RunTask) -> Result<(), DriverError> {
        self.submitted.push(task.clone());
        self.tx.send(task).map_err(|_| DriverError::Disconnected)
    }

    /// Flag that cancels every in-flight and queued run when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Closes the queue, waits for the workers and returns one report per
    /// submitted task, in task order.
    ///
    /// A task whose report never arrived is reported as
    /// [`DriverError::WorkerPanicked`].
    pub fn finish(self) -> Vec<RunReport> {
        drop(self.tx);
        for handle in self.workers {
            if handle.join().is_err() {
                error!("A worker thread panicked");
            }
        }
        let mut reports: Vec<RunReport> = self.results.try_iter().collect();

        if reports.len() < self.submitted.len() {
            let reported: BTreeSet<usize> = reports.iter().map(|r| r.task.index).collect();
            for task in self.submitted {
                if !reported.contains(&task.index) {
                    error!("No report for task {}", task.index);
                    let index = task.index;
                    reports.push(RunReport {
                        task,
                        result: Err(DriverError::WorkerPanicked(index)),
                    });
                }
            }
        }
        reports.sort_by_key(|r| r.task.index);
        reports
    }
}

fn execute(task: &RunTask, sink: &dyn RunSink, cancel: &AtomicBool) -> Result<RunSummary, DriverError> {
    let runner = SimulationRunner::new(task.config.clone())?;
    let outcome = runner.run_until_cancelled(cancel);
    let output = sink.commit(task, &outcome)?;
    Ok(RunSummary::new(task, &outcome, output))
}

/// Runs every task on a fresh pool and returns the reports in task order.
pub fn run_batch(
    tasks: Vec<RunTask>,
    config: &PoolConfig,
    sink: Arc<dyn RunSink>,
) -> Result<Vec<RunReport>, DriverError> {
    let total = tasks.len();
    info!("Running {} tasks on {} workers", total, config.workers.max(1));

    let mut pool = WorkerPool::start(config, sink)?;
    for task in tasks {
        pool.submit(task)?;
    }
    let reports = pool.finish();

    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    info!("Batch finished: {}/{} tasks succeeded", total - failed, total);
    Ok(reports)
}
