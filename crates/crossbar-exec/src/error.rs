//! Error type for executor runs.

use thiserror::Error;

use crossbar_sched::SchedError;

/// A failed run. Wraps the scheduling failure that aborted it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecError {
    /// The scheduler rejected or aborted the program.
    #[error(transparent)]
    Sched(#[from] SchedError),
}

impl ExecError {
    /// The source line to attribute the failure to, where one exists.
    pub fn line(&self) -> Option<u32> {
        match self {
            ExecError::Sched(err) => err.line(),
        }
    }
}

/// Result type for executor runs.
pub type ExecResult<T> = Result<T, ExecError>;
