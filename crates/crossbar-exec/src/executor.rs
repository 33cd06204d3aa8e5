//! The driving loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::info;

use crossbar_model::CrossbarModel;
use crossbar_ops::Program;
use crossbar_sched::Scheduler;

use crate::error::{ExecError, ExecResult};

/// Explicit run configuration.
///
/// Settings that would otherwise tempt a process-wide global (pacing
/// for animated hosts) are threaded through here instead.
#[derive(Debug, Clone, Default)]
pub struct ExecConfig {
    /// Optional pacing delay after each committed cycle, for hosts that
    /// animate the run. `None` runs at full speed.
    pub cycle_delay: Option<Duration>,
}

impl ExecConfig {
    /// Configuration with a per-cycle pacing delay.
    pub fn paced(cycle_delay: Duration) -> Self {
        Self {
            cycle_delay: Some(cycle_delay),
        }
    }
}

/// Shared flag to stop a run at the next cycle boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The run stops before its next cycle.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress and terminal events emitted during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    /// One cycle was solved and committed.
    CycleDone {
        /// The committed cycle.
        cycle: u32,
    },
    /// The whole program completed.
    Completed {
        /// Total cycles executed.
        cycles: u32,
    },
    /// The run aborted.
    Failed {
        /// Human-readable reason.
        message: String,
        /// Source line of the offending operation, where known.
        line: Option<u32>,
    },
}

/// How a run ended, short of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every cycle committed.
    Completed {
        /// Total cycles executed.
        cycles: u32,
    },
    /// Cancellation was requested between cycles.
    Cancelled {
        /// The first cycle that did not run.
        at_cycle: u32,
    },
}

/// Drives a [`Scheduler`] across a whole program.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecConfig,
    cancel: CancelFlag,
}

impl Executor {
    /// Create an executor with the given configuration.
    pub fn new(config: ExecConfig) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// A handle that can stop this executor's runs between cycles.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run a program to completion, failure, or cancellation.
    ///
    /// `sink` receives a [`ExecEvent::CycleDone`] after every committed
    /// cycle and exactly one terminal event. On failure the model is
    /// left at the state of the last committed cycle.
    pub fn run(
        &self,
        model: &mut CrossbarModel,
        program: &Program,
        sink: &mut dyn FnMut(ExecEvent),
    ) -> ExecResult<RunOutcome> {
        let scheduler = Scheduler::new(program);
        let max_cycle = scheduler.max_cycle();
        info!(
            operations = scheduler.operations().len(),
            max_cycle, "run starting"
        );

        for cycle in 0..max_cycle {
            if self.cancel.is_cancelled() {
                info!(cycle, "run cancelled");
                return Ok(RunOutcome::Cancelled { at_cycle: cycle });
            }
            if let Err(err) = scheduler.run_cycle(model, cycle) {
                let err = ExecError::from(err);
                info!(cycle, error = %err, "run aborted");
                sink(ExecEvent::Failed {
                    message: err.to_string(),
                    line: err.line(),
                });
                return Err(err);
            }
            sink(ExecEvent::CycleDone { cycle });
            if let Some(delay) = self.config.cycle_delay {
                std::thread::sleep(delay);
            }
        }

        info!(cycles = max_cycle, "run completed");
        sink(ExecEvent::Completed { cycles: max_cycle });
        Ok(RunOutcome::Completed { cycles: max_cycle })
    }
}
