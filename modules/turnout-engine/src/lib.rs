//! The decision-and-simulation core.
//!
//! One engine owns the capability-based rule matcher, the incident/resource
//! state machine, the travel planner with its deferred transitions, the
//! periodic severity tick, and the after-action scorer. Storage, the event
//! log, the broadcast sink and the delayed-work scheduler are all seams;
//! production wires tokio and memory implementations, tests wire manual ones.

pub mod aar;
pub mod dispatch;
pub mod random;
pub mod rules;
pub mod scheduler;
pub mod tick;
pub mod travel;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use turnout_common::Config;
use turnout_events::{EventLog, EventSink, Recorder};
use turnout_store::Repository;

pub use aar::{AfterActionReport, AarScores, AarTimings, SentUnit};
pub use dispatch::{AssignmentRequest, IncidentDetail, NewIncident};
pub use random::{FixedRandom, RandomSource, ThreadRandom};
pub use rules::RuleSetDraft;
pub use scheduler::{Job, JobRunner, ManualScheduler, Scheduler, TokioScheduler};
pub use travel::{TravelJob, TravelPhase};

#[derive(Clone)]
pub struct DispatchEngine {
    pub(crate) store: Arc<dyn Repository>,
    pub(crate) recorder: Recorder,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) config: Config,
    pub(crate) random: Arc<dyn RandomSource>,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn Repository>,
        recorder: Recorder,
        scheduler: Arc<dyn Scheduler>,
        config: Config,
    ) -> Self {
        Self {
            store,
            recorder,
            scheduler,
            config,
            random: Arc::new(ThreadRandom),
        }
    }

    /// Replace the randomness source (tests pin the call-update roll).
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }
}

/// Deferred work lands here. No caller waits on these, so failures are
/// logged and swallowed rather than propagated.
#[async_trait]
impl JobRunner for DispatchEngine {
    async fn run(&self, job: Job) {
        match job {
            Job::Travel(travel) => {
                if let Err(e) = self.run_travel(travel).await {
                    warn!(error = %e, "travel transition failed");
                }
            }
            Job::Tick => {
                if let Err(e) = self.tick().await {
                    warn!(error = %e, "simulation tick failed");
                }
            }
        }
    }
}

/// Wire the engine with the tokio scheduler. The scheduler needs the engine
/// to run jobs and the engine needs the scheduler to arrange them, so the
/// binding happens after both exist.
pub fn build_engine(
    store: Arc<dyn Repository>,
    log: Arc<dyn EventLog>,
    sink: Arc<dyn EventSink>,
    config: Config,
) -> Arc<DispatchEngine> {
    let scheduler = Arc::new(TokioScheduler::new());
    let engine = Arc::new(DispatchEngine::new(
        store,
        Recorder::new(log, sink),
        scheduler.clone(),
        config,
    ));
    scheduler.bind(engine.clone());
    engine
}
