//! Round scheduler: runs every non-idle role of a round concurrently.

use crate::error::EnvError;
use crate::role::Role;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Phase of the round currently being driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Selecting non-idle roles
    Collecting,
    /// Starting `run` on each selected role
    Dispatching,
    /// Waiting for every dispatched role
    AwaitingAll,
    /// All dispatched roles finished
    Done,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Collecting => write!(f, "collecting"),
            RoundPhase::Dispatching => write!(f, "dispatching"),
            RoundPhase::AwaitingAll => write!(f, "awaiting_all"),
            RoundPhase::Done => write!(f, "done"),
        }
    }
}

/// Outcome of one completed round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundStats {
    pub round: usize,
    /// Roles dispatched, in dispatch order
    pub dispatched: Vec<String>,
}

/// Drives bounded rounds over a snapshot of roles.
///
/// Rounds never cancel: when a role fails, the remaining dispatched roles
/// still run to completion, and the first failure in dispatch order is
/// returned once all of them are done.
pub struct RoundScheduler {
    phase: Mutex<RoundPhase>,
    rounds_completed: AtomicUsize,
}

impl Default for RoundScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundScheduler {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(RoundPhase::Done),
            rounds_completed: AtomicUsize::new(0),
        }
    }

    /// Phase of the most recent round
    pub fn phase(&self) -> RoundPhase {
        *self.phase.lock()
    }

    /// Rounds driven to completion, including failed and empty ones
    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed.load(Ordering::SeqCst)
    }

    fn enter(&self, round: usize, phase: RoundPhase) {
        debug!(round, phase = %phase, "Round phase");
        *self.phase.lock() = phase;
    }

    /// Run one round over `roles`.
    ///
    /// A round with zero non-idle roles still completes and is counted.
    pub async fn run_round(
        &self,
        round: usize,
        roles: Vec<Arc<dyn Role>>,
    ) -> Result<RoundStats, EnvError> {
        self.enter(round, RoundPhase::Collecting);
        let active: Vec<Arc<dyn Role>> = roles.into_iter().filter(|r| !r.is_idle()).collect();
        let dispatched: Vec<String> = active.iter().map(|r| r.name().to_string()).collect();

        self.enter(round, RoundPhase::Dispatching);
        let runs: Vec<_> = active.iter().map(|role| role.run()).collect();

        self.enter(round, RoundPhase::AwaitingAll);
        let results = join_all(runs).await;

        self.enter(round, RoundPhase::Done);
        self.rounds_completed.fetch_add(1, Ordering::SeqCst);

        let mut first_failure = None;
        for (name, result) in dispatched.iter().zip(results) {
            if let Err(e) = result {
                error!(round, role = %name, error = %e, "Role run failed");
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(RoundStats { round, dispatched }),
        }
    }
}
