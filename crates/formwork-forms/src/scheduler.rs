//! Next-tick job scheduling.
//!
//! Change notifications are not sent synchronously. A field schedules a job
//! keyed by its id; scheduling again before the next tick replaces the
//! pending job, so a burst of changes produces one notification. Jobs run
//! when the frame is flushed, either explicitly or by the loop started with
//! [`FrameScheduler::spawn_frame_loop`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

type Job = Box<dyn FnOnce() + Send>;

/// A coalescing queue of jobs run once per frame.
#[derive(Default)]
pub struct FrameScheduler {
    jobs: Mutex<Vec<(String, Job)>>,
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl FrameScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `job` for the next frame under `key`.
    ///
    /// Returns `false` if a job with the same key was already pending; that
    /// job is replaced and keeps its place in the queue.
    pub fn schedule(&self, key: impl Into<String>, job: impl FnOnce() + Send + 'static) -> bool {
        let key = key.into();
        let fresh = {
            let mut jobs = self.jobs.lock().expect("frame queue lock poisoned");
            if let Some(slot) = jobs.iter_mut().find(|(k, _)| *k == key) {
                trace!(key = %key, "Coalescing with pending frame job");
                slot.1 = Box::new(job);
                false
            } else {
                jobs.push((key, Box::new(job)));
                true
            }
        };
        fresh
    }

    /// Number of jobs waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.jobs.lock().expect("frame queue lock poisoned").len()
    }

    /// Runs every pending job in queue order and returns how many ran.
    ///
    /// Jobs scheduled while flushing wait for the following frame.
    pub fn flush(&self) -> usize {
        let jobs = std::mem::take(&mut *self.jobs.lock().expect("frame queue lock poisoned"));
        let count = jobs.len();
        for (_, job) in jobs {
            job();
        }
        count
    }

    /// Spawns a task that flushes the queue every `interval`. The task ends
    /// once the scheduler is dropped.
    pub fn spawn_frame_loop(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(scheduler) = weak.upgrade() else {
                    trace!("Frame scheduler dropped; stopping frame loop");
                    break;
                };
                scheduler.flush();
            }
        })
    }
}
