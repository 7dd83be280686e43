//! Delayed-job facility
//!
//! [`JobQueue`] is the seam the scheduler builds on: fire a payload once after
//! a delay, cancellable by tag. [`TokioJobQueue`] implements it with one tokio
//! task per pending job and hands matured payloads to a channel, the same way
//! channel adapters hand incoming messages to the bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::reminder::JobPayload;
use crate::tag::JobTag;

/// A timer service that runs each payload at most once per enqueue, after at
/// least the requested delay.
pub trait JobQueue: Send + Sync {
    /// Submit a one-shot job. A zero delay is rejected.
    fn enqueue(&self, tag: JobTag, delay: Duration, payload: JobPayload) -> Result<(), SchedulerError>;

    /// Cancel every pending job under `tag`. Unknown tags are a no-op.
    fn cancel(&self, tag: &JobTag);

    /// Cancel every pending job this queue knows about.
    fn cancel_all(&self);

    fn is_pending(&self, tag: &JobTag) -> bool;

    /// One entry per pending job, so duplicate submissions under the same
    /// tag show up more than once.
    fn pending(&self) -> Vec<JobTag>;
}

/// Cancellation handle for one spawned job.
struct PendingJob {
    id: u64,
    token: CancellationToken,
}

type JobMap = HashMap<JobTag, Vec<PendingJob>>;

/// In-process [`JobQueue`] backed by tokio timers.
///
/// Pending jobs do not survive the process; callers rebuild them with
/// `Scheduler::reschedule_all` at startup.
///
/// Delays run on tokio's monotonic clock, which does not advance while the
/// machine is suspended. A job fires late by the time spent asleep; the
/// successor is computed from the wall clock, so the drift does not carry
/// over to later weeks.
pub struct TokioJobQueue {
    runtime: Handle,
    fired_tx: mpsc::Sender<JobPayload>,
    jobs: Arc<Mutex<JobMap>>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

impl TokioJobQueue {
    /// Create a queue whose jobs run on `runtime`, together with the receiver
    /// that matured payloads are delivered to.
    pub fn new(runtime: Handle, buffer_size: usize) -> (Self, mpsc::Receiver<JobPayload>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        info!("Created job queue with buffer size {}", buffer_size);
        let queue = Self {
            runtime,
            fired_tx: tx,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        };
        (queue, rx)
    }

    /// Cancel everything and refuse further submissions.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        lock(&self.jobs).clear();
        info!("Job queue shut down");
    }

    pub fn len(&self) -> usize {
        lock(&self.jobs).values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobQueue for TokioJobQueue {
    fn enqueue(&self, tag: JobTag, delay: Duration, payload: JobPayload) -> Result<(), SchedulerError> {
        if self.shutdown.is_cancelled() {
            return Err(SchedulerError::QueueClosed);
        }
        if delay.is_zero() {
            return Err(SchedulerError::PastDue { tag });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = self.shutdown.child_token();
        lock(&self.jobs)
            .entry(tag.clone())
            .or_default()
            .push(PendingJob { id, token: token.clone() });

        let jobs = Arc::clone(&self.jobs);
        let tx = self.fired_tx.clone();
        debug!("Enqueued job {} (#{}) firing in {:?}", tag, id, delay);

        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Job {} (#{}) cancelled", tag, id);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            // Losing this race means a cancel got here first.
            if !take_job(&jobs, &tag, id) {
                return;
            }

            debug!("Job {} (#{}) matured", tag, id);
            if let Err(e) = tx.send(payload).await {
                warn!("Dropping matured job {}: receiver closed ({})", tag, e);
            }
        });

        Ok(())
    }

    fn cancel(&self, tag: &JobTag) {
        if let Some(pending) = lock(&self.jobs).remove(tag) {
            debug!("Cancelling {} pending job(s) for {}", pending.len(), tag);
            for job in pending {
                job.token.cancel();
            }
        }
    }

    fn cancel_all(&self) {
        let drained: Vec<PendingJob> = lock(&self.jobs).drain().flat_map(|(_, jobs)| jobs).collect();
        info!("Cancelling all {} pending job(s)", drained.len());
        for job in drained {
            job.token.cancel();
        }
    }

    fn is_pending(&self, tag: &JobTag) -> bool {
        lock(&self.jobs).get(tag).is_some_and(|jobs| !jobs.is_empty())
    }

    fn pending(&self) -> Vec<JobTag> {
        let jobs = lock(&self.jobs);
        let mut tags: Vec<JobTag> = jobs
            .iter()
            .flat_map(|(tag, pending)| std::iter::repeat_n(tag.clone(), pending.len()))
            .collect();
        tags.sort();
        tags
    }
}

impl Drop for TokioJobQueue {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Remove job `id` from the map. Returns false if it was already gone.
fn take_job(jobs: &Mutex<JobMap>, tag: &JobTag, id: u64) -> bool {
    let mut jobs = lock(jobs);
    let Some(pending) = jobs.get_mut(tag) else {
        return false;
    };
    let before = pending.len();
    pending.retain(|job| job.id != id);
    let removed = pending.len() != before;
    if pending.is_empty() {
        jobs.remove(tag);
    }
    removed
}

fn lock(jobs: &Mutex<JobMap>) -> MutexGuard<'_, JobMap> {
    // The map stays consistent even if a holder panicked mid-update.
    jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
