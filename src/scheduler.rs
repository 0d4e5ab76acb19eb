//! One-shot reminder scheduling
//!
//! A single worker task owns a min-heap of pending jobs and sleeps until
//! the earliest deadline. Each job fires exactly once; its callback runs on
//! its own task so a panicking callback never takes the worker down.
//! Shutdown is immediate and drops whatever is still pending.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

use chrono::{DateTime, Local};
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{Error, Result};

/// Callback invoked when a reminder becomes due
pub type ReminderCallback = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// A reminder waiting to fire
struct Job {
    id: Uuid,
    label: String,
    deadline: Instant,
    seq: u64,
    callback: ReminderCallback,
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Job {}

impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Job {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the earliest deadline; sequence
        // number breaks ties in insertion order
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

enum Command {
    Schedule(Job),
    Shutdown,
}

/// Schedules one-shot reminders on a dedicated worker task
pub struct ReminderScheduler {
    tx: mpsc::UnboundedSender<Command>,
    pending: Arc<AtomicUsize>,
    seq: AtomicU64,
}

impl ReminderScheduler {
    /// Create a scheduler and spawn its worker task
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        tokio::spawn(run_worker(rx, Arc::clone(&pending)));
        Self {
            tx,
            pending,
            seq: AtomicU64::new(0),
        }
    }

    /// Schedule `callback` to run once at `fire_at`
    ///
    /// A deadline already in the past fires immediately. Returns the job
    /// id.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler has been shut down.
    pub fn schedule(
        &self,
        fire_at: DateTime<Local>,
        label: impl Into<String>,
        callback: ReminderCallback,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let label = label.into();
        let delay = (fire_at - Local::now()).to_std().unwrap_or(Duration::ZERO);

        let job = Job {
            id,
            label: label.clone(),
            deadline: Instant::now() + delay,
            seq: self.seq.fetch_add(1, AtomicOrdering::Relaxed),
            callback,
        };

        self.tx
            .send(Command::Schedule(job))
            .map_err(|_| Error::Scheduler("scheduler is shut down".to_string()))?;
        self.pending.fetch_add(1, AtomicOrdering::SeqCst);
        tracing::debug!(%id, label = %label, fire_at = %fire_at, "reminder scheduled");
        Ok(id)
    }

    /// Number of reminders not yet fired
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(AtomicOrdering::SeqCst)
    }

    /// Stop the worker without waiting; pending reminders are dropped
    ///
    /// Callbacks already firing are unaffected.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<Command>, pending: Arc<AtomicUsize>) {
    let mut heap: BinaryHeap<Job> = BinaryHeap::new();

    loop {
        let next_deadline = heap.peek().map(|job| job.deadline);

        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Schedule(job)) => heap.push(job),
                Some(Command::Shutdown) | None => break,
            },
            () = sleep_until_deadline(next_deadline) => fire_due(&mut heap, &pending),
        }
    }

    let dropped = heap.len();
    if dropped > 0 {
        tracing::debug!(count = dropped, "dropping pending reminders");
    }
    pending.store(0, AtomicOrdering::SeqCst);
}

/// Sleep until the deadline, or forever when the heap is empty
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Pop and fire every job whose deadline has passed
///
/// A late wakeup fires all overdue jobs; nothing is skipped.
fn fire_due(heap: &mut BinaryHeap<Job>, pending: &AtomicUsize) {
    let now = Instant::now();
    while heap.peek().is_some_and(|job| job.deadline <= now) {
        let Some(job) = heap.pop() else { break };
        pending.fetch_sub(1, AtomicOrdering::SeqCst);
        tracing::info!(id = %job.id, label = %job.label, "reminder due");

        let handle = tokio::spawn((job.callback)());
        let id = job.id;
        tokio::spawn(async move {
            if let Err(e) = handle.await {
                tracing::error!(%id, error = %e, "reminder callback panicked");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Duration as TimeDelta;
    use futures::FutureExt;
    use tokio_test::assert_ok;

    use super::*;

    fn counting_callback(count: &Arc<AtomicUsize>) -> ReminderCallback {
        let count = Arc::clone(count);
        Box::new(move || {
            async move {
                count.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_exactly_once() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        tokio_test::assert_ok!(scheduler.schedule(
            Local::now() + TimeDelta::seconds(30),
            "water the plants",
            counting_callback(&fired),
        ));
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn same_deadline_jobs_all_fire() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fire_at = Local::now() + TimeDelta::seconds(10);

        tokio_test::assert_ok!(scheduler.schedule(fire_at, "first", counting_callback(&fired)));
        tokio_test::assert_ok!(scheduler.schedule(fire_at, "second", counting_callback(&fired)));

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn late_wakeup_fires_every_due_job() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for seconds in [10, 20, 30] {
            tokio_test::assert_ok!(scheduler.schedule(
                Local::now() + TimeDelta::seconds(seconds),
                "due",
                counting_callback(&fired),
            ));
        }

        tokio::time::sleep(Duration::from_secs(600)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn past_deadline_fires_immediately() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        tokio_test::assert_ok!(scheduler.schedule(
            Local::now() - TimeDelta::seconds(10),
            "overdue",
            counting_callback(&fired),
        ));

        tokio::time::sleep(Duration::from_secs(1)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drops_pending_jobs() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        tokio_test::assert_ok!(scheduler.schedule(
            Local::now() + TimeDelta::seconds(60),
            "never",
            counting_callback(&fired),
        ));
        scheduler.shutdown();

        tokio::time::sleep(Duration::from_secs(300)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_after_shutdown_errors() {
        let scheduler = ReminderScheduler::new();
        scheduler.shutdown();
        tokio::time::sleep(Duration::from_millis(10)).await;
        settle().await;

        let result = scheduler.schedule(
            Local::now() + TimeDelta::seconds(5),
            "too late",
            Box::new(|| async {}.boxed()),
        );
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_callback_does_not_stop_later_jobs() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        tokio_test::assert_ok!(scheduler.schedule(
            Local::now() + TimeDelta::seconds(5),
            "boom",
            Box::new(|| async { panic!("callback failure") }.boxed()),
        ));
        tokio_test::assert_ok!(scheduler.schedule(
            Local::now() + TimeDelta::seconds(10),
            "survivor",
            counting_callback(&fired),
        ));

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }
}
