//! Periodic scheduling of pipeline cycles.
//!
//! [`Scheduler::spawn`] starts a background task that runs one cycle
//! immediately and then one per interval. Cycles never overlap: the next
//! tick is only awaited after the previous cycle has returned.
//!
//! [`SchedulerHandle::shutdown`] stops the periodic task (letting an
//! in-flight cycle finish), then runs one final cycle so pending results
//! are flushed before the process exits.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::remote::RemoteStore;
use crate::sync::{CycleReport, SyncPipeline};

/// Default time between cycles (3 minutes).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3 * 60);

/// Runs a pipeline on a fixed interval.
pub struct Scheduler<S> {
    pipeline: Arc<SyncPipeline<S>>,
    interval: Duration,
}

impl<S: RemoteStore + 'static> Scheduler<S> {
    pub fn new(pipeline: SyncPipeline<S>, interval: Duration) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Start the periodic task.
    pub fn spawn(self) -> SchedulerHandle<S> {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let pipeline = Arc::clone(&self.pipeline);
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval = ?ticker.period(), "scan interval");

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => run_cycle(&pipeline).await,
                }
            }

            tracing::debug!("periodic task stopped");
        });

        SchedulerHandle {
            pipeline: self.pipeline,
            stop: stop_tx,
            task,
        }
    }
}

/// Handle to a running scheduler.
///
/// Dropping the handle stops the periodic task without a final cycle.
pub struct SchedulerHandle<S> {
    pipeline: Arc<SyncPipeline<S>>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl<S: RemoteStore + 'static> SchedulerHandle<S> {
    /// Stop the periodic task, then run one last cycle.
    ///
    /// # Errors
    ///
    /// Returns the final cycle's error, if any.
    pub async fn shutdown(self) -> Result<CycleReport> {
        tracing::info!("Shutting down...");

        // The task may already be gone; the final cycle runs either way.
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "periodic task ended abnormally");
        }

        self.pipeline.process_results().await
    }

    pub fn pipeline(&self) -> &SyncPipeline<S> {
        &self.pipeline
    }
}

/// Run one cycle, confining any error to it.
async fn run_cycle<S: RemoteStore>(pipeline: &SyncPipeline<S>) {
    match pipeline.process_results().await {
        Ok(report) => tracing::debug!(?report, "cycle finished"),
        Err(e) => tracing::error!(error = %e, "cycle failed, files kept for the next run"),
    }
}

/// Install stop listeners (Ctrl-C, and SIGTERM on Unix) and return a
/// future that resolves when either fires.
///
/// The listeners are registered before this returns, so a signal that
/// arrives while the caller is still starting up is not lost. Must be
/// called from within a tokio runtime.
#[cfg(unix)]
pub fn shutdown_signal() -> impl Future<Output = ()> + Send {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = listen(signal(SignalKind::interrupt()), "Ctrl-C");
    let terminate = listen(signal(SignalKind::terminate()), "SIGTERM");

    async move {
        tokio::select! {
            () = interrupt => {}
            () = terminate => {}
        }
    }
}

/// Install the Ctrl-C listener and return a future that resolves on it.
#[cfg(not(unix))]
pub fn shutdown_signal() -> impl Future<Output = ()> + Send {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

/// A listener that failed to register never resolves.
#[cfg(unix)]
fn listen(
    registered: std::io::Result<tokio::signal::unix::Signal>,
    name: &'static str,
) -> impl Future<Output = ()> + Send {
    let stream = match registered {
        Ok(stream) => Some(stream),
        Err(e) => {
            tracing::warn!(error = %e, "could not listen for {name}");
            None
        }
    };

    async move {
        match stream {
            Some(mut stream) => {
                stream.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
