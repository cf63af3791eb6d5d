//! Periodic propagation sweep.
//!
//! Re-evaluates completion conditions every few seconds so that deferred
//! system-linked updates (payments confirmed early, card completions that
//! arrived before their gate opened) are eventually applied. The task must
//! be stoppable when its owning view is torn down.

use std::sync::Arc;
use std::time::Duration;

use procflow_store::Store;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::FlowResult;
use crate::propagator;

/// Handle to a running sweep task. Aborts on `stop()` or on drop, so a
/// discarded handle never leaves a dangling timer.
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the periodic re-evaluation task.
///
/// `open` is called at the top of every tick. A snapshot-backed caller
/// returns a freshly opened store so facts written by other processes since
/// the last tick are visible; an in-process caller just clones its `Arc`.
pub fn spawn_sweep<F>(open: F, period: Duration) -> SweepHandle
where
    F: Fn() -> FlowResult<Arc<Store>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // the first tick fires immediately; that is fine for a sweep
        loop {
            interval.tick().await;
            debug!("running propagation sweep");
            match open() {
                Ok(store) => {
                    if let Err(e) = propagator::run_sweep(&store) {
                        warn!(error = %e, "propagation sweep failed");
                    }
                }
                Err(e) => warn!(error = %e, "could not open store for sweep"),
            }
        }
    });
    SweepHandle { handle }
}
