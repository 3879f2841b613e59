//! Background compute thread.
//!
//! Runs [`execute`] off the owning thread so an editor never blocks.
//! Progress is streamed over an unbounded channel; the owner polls it and
//! finally joins the worker to get the outcome, which it then hands to
//! [`Setup::apply`](crate::Setup::apply).

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, warn};

use crate::compute::{CancelToken, ComputeOutcome, ComputeProgress, execute};
use crate::error::{SetupError, SetupResult};
use crate::plan::ComputePlan;
use crate::simulator::Simulator;

/// Handle to a computation running on its own thread.
#[derive(Debug)]
pub struct ComputeWorker {
    handle: JoinHandle<SetupResult<ComputeOutcome>>,
    progress: UnboundedReceiver<ComputeProgress>,
    cancel: CancelToken,
}

impl ComputeWorker {
    /// Spawn the worker thread for `plan`.
    pub fn spawn<S>(plan: ComputePlan, simulator: Arc<S>) -> SetupResult<Self>
    where
        S: Simulator + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let name = plan.simulation_name.clone();

        let handle = thread::Builder::new()
            .name(format!("qexplorer-compute-{name}"))
            .spawn(move || {
                execute(&plan, simulator.as_ref(), &token, |p| {
                    // The owner may have dropped the receiver; keep computing.
                    let _ = tx.send(p);
                })
            })?;
        debug!(simulation = %name, "compute worker spawned");

        Ok(Self {
            handle,
            progress: rx,
            cancel,
        })
    }

    /// Ask the worker to stop before its next sequence step.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Next progress report, if one is queued.
    pub fn try_progress(&mut self) -> Option<ComputeProgress> {
        self.progress.try_recv().ok()
    }

    /// Block until the next progress report; `None` once the worker is done.
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait_progress(&mut self) -> Option<ComputeProgress> {
        self.progress.blocking_recv()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and return its outcome.
    pub fn join(self) -> SetupResult<ComputeOutcome> {
        self.handle.join().unwrap_or_else(|_| {
            warn!("compute worker panicked");
            Err(SetupError::WorkerLost)
        })
    }
}
