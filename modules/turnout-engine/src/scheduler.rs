//! Delayed-work seam: "run this job after N milliseconds", at-least-once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;
use turnout_common::JobHandle;

use crate::travel::TravelJob;

#[derive(Debug, Clone)]
pub enum Job {
    Travel(TravelJob),
    Tick,
}

/// Executes scheduled jobs. Implemented by the engine.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: Job);
}

pub trait Scheduler: Send + Sync {
    /// Fire-and-forget one-shot. The caller gets no handle and no result.
    fn schedule(&self, job: Job, delay: Duration);

    /// Arrange a recurring job. The returned handle is the only way to stop it.
    fn schedule_recurring(&self, job: Job, period: Duration) -> JobHandle;

    /// Cancel a recurring job. Unknown or already-cancelled handles are a
    /// no-op; cancellation always succeeds from the caller's point of view.
    fn cancel(&self, handle: JobHandle);
}

// ---------------------------------------------------------------------------
// TokioScheduler (production)
// ---------------------------------------------------------------------------

/// Tokio-backed scheduler. One spawned task per job; recurring jobs loop on
/// a sleep and check a cancellation flag between runs, so a run already in
/// flight completes even if the job is cancelled meanwhile.
#[derive(Default)]
pub struct TokioScheduler {
    runner: OnceLock<Arc<dyn JobRunner>>,
    recurring: Mutex<HashMap<JobHandle, Arc<AtomicBool>>>,
    next_handle: AtomicU64,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the job runner. Called once during wiring, after the engine
    /// exists; jobs scheduled before binding are dropped with a warning.
    pub fn bind(&self, runner: Arc<dyn JobRunner>) {
        if self.runner.set(runner).is_err() {
            warn!("scheduler runner already bound");
        }
    }

    fn runner(&self) -> Option<Arc<dyn JobRunner>> {
        self.runner.get().cloned()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, job: Job, delay: Duration) {
        let Some(runner) = self.runner() else {
            warn!("no runner bound; dropping scheduled job");
            return;
        };
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            runner.run(job).await;
        });
    }

    fn schedule_recurring(&self, job: Job, period: Duration) -> JobHandle {
        let handle = JobHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let Some(runner) = self.runner() else {
            warn!("no runner bound; recurring job not started");
            return handle;
        };
        let cancelled = Arc::new(AtomicBool::new(false));
        self.recurring
            .lock()
            .unwrap()
            .insert(handle, cancelled.clone());
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if cancelled.load(Ordering::Relaxed) {
                    break;
                }
                runner.run(job.clone()).await;
            }
        });
        handle
    }

    fn cancel(&self, handle: JobHandle) {
        if let Some(flag) = self.recurring.lock().unwrap().remove(&handle) {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

// ---------------------------------------------------------------------------
// ManualScheduler (tests)
// ---------------------------------------------------------------------------

/// Records what was scheduled instead of running it. Tests drain the queue
/// and fire jobs against the engine at moments of their choosing.
#[derive(Default)]
pub struct ManualScheduler {
    one_shots: Mutex<Vec<(Job, Duration)>>,
    recurring: Mutex<Vec<(Job, Duration, JobHandle)>>,
    cancelled: Mutex<Vec<JobHandle>>,
    next_handle: AtomicU64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every one-shot scheduled so far, in scheduling order.
    pub fn drain(&self) -> Vec<(Job, Duration)> {
        std::mem::take(&mut *self.one_shots.lock().unwrap())
    }

    pub fn recurring(&self) -> Vec<(Job, Duration, JobHandle)> {
        self.recurring.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<JobHandle> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, job: Job, delay: Duration) {
        self.one_shots.lock().unwrap().push((job, delay));
    }

    fn schedule_recurring(&self, job: Job, period: Duration) -> JobHandle {
        let handle = JobHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.recurring.lock().unwrap().push((job, period, handle));
        handle
    }

    fn cancel(&self, handle: JobHandle) {
        self.cancelled.lock().unwrap().push(handle);
    }
}
