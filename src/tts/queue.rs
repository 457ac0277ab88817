//! Sequential job queue.
//!
//! Jobs are started one at a time in the order they were enqueued. A job
//! receives a [`CompletionSignal`] when it starts and the next job is not
//! started until that signal is consumed. A job that holds on to its signal
//! forever stalls the queue unless a watchdog timeout is configured.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, error, warn};

use crate::errors::{RelayError, Result};

/// A unit of deferred work.
///
/// `start` must eventually consume the signal it is given, usually from a
/// task it spawns. Closures taking a [`CompletionSignal`] implement this.
pub trait Job: Send + 'static {
    fn start(self: Box<Self>, done: CompletionSignal);
}

impl<F> Job for F
where
    F: FnOnce(CompletionSignal) + Send + 'static,
{
    fn start(self: Box<Self>, done: CompletionSignal) {
        (*self)(done)
    }
}

type TaskSlot = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Exactly-once completion notification handed to a running job.
#[must_use = "a job that never consumes its completion signal stalls the queue"]
#[derive(Debug)]
pub struct CompletionSignal {
    sender: oneshot::Sender<std::result::Result<(), String>>,
    task: TaskSlot,
}

impl CompletionSignal {
    fn new() -> (
        Self,
        oneshot::Receiver<std::result::Result<(), String>>,
        TaskSlot,
    ) {
        let (sender, receiver) = oneshot::channel();
        let task = TaskSlot::default();
        (
            Self {
                sender,
                task: task.clone(),
            },
            receiver,
            task,
        )
    }

    /// Handle for registering the task that does the job's work.
    ///
    /// Take it before moving the signal into the task, then
    /// [`JobTask::attach`] the spawned task's handle.
    pub fn job_task(&self) -> JobTask {
        JobTask {
            slot: self.task.clone(),
        }
    }

    /// Report that the job finished.
    pub fn done(self) {
        // The receiver is gone only when the watchdog already released the job.
        let _ = self.sender.send(Ok(()));
    }

    /// Report that the job finished with an error.
    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.sender.send(Err(reason.into()));
    }
}

/// The task running a job's work, as seen by the queue worker.
///
/// When the watchdog releases a job, its attached task is aborted and
/// awaited before the next job starts, so released work cannot overlap
/// with the job that follows it.
#[derive(Debug, Clone)]
pub struct JobTask {
    slot: TaskSlot,
}

impl JobTask {
    pub fn attach(self, task: JoinHandle<()>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }
}

async fn abort_task(slot: &TaskSlot) {
    let task = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(task) = task {
        task.abort();
        // Resolves once the task's future has been dropped.
        let _ = task.await;
    }
}

/// How a job left the running slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed(String),
    /// The signal was dropped without being consumed (including a panic
    /// while the job was starting).
    Abandoned,
    /// The watchdog released the job.
    TimedOut,
}

/// Snapshot of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueState {
    pub pending: usize,
    pub running: bool,
    pub completed: u64,
}

impl QueueState {
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && !self.running
    }
}

type BoxedJob = Box<dyn Job>;

/// Handle to a single-worker FIFO job queue.
///
/// Cloning the handle shares the same queue. The worker exits once every
/// handle has been dropped and the remaining jobs have run.
#[derive(Clone)]
pub struct SequentialJobQueue {
    sender: mpsc::UnboundedSender<BoxedJob>,
    state: Arc<watch::Sender<QueueState>>,
}

impl std::fmt::Debug for SequentialJobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialJobQueue")
            .field("state", &self.state())
            .finish()
    }
}

impl SequentialJobQueue {
    /// Create a queue without a watchdog. Must be called inside a tokio runtime.
    pub fn new() -> Self {
        Self::spawn(None).0
    }

    /// Create a queue that force-completes jobs running longer than `timeout`.
    pub fn with_job_timeout(timeout: Duration) -> Self {
        Self::spawn(Some(timeout)).0
    }

    /// Create a queue and return the worker's join handle alongside it.
    pub fn spawn(job_timeout: Option<Duration>) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(watch::Sender::new(QueueState::default()));

        let worker = tokio::spawn(run_worker(receiver, state.clone(), job_timeout));

        (Self { sender, state }, worker)
    }

    /// Append a job to the tail of the queue. Never waits for the job to run.
    pub fn enqueue<J: Job>(&self, job: J) -> Result<()> {
        // Counted before sending so the worker never sees a job it has not been told about.
        self.state.send_modify(|state| state.pending += 1);

        if self.sender.send(Box::new(job)).is_err() {
            self.state.send_modify(|state| state.pending -= 1);
            return Err(RelayError::QueueClosed);
        }

        Ok(())
    }

    pub fn state(&self) -> QueueState {
        *self.state.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.state().running
    }

    /// Number of jobs waiting behind the running one.
    pub fn len(&self) -> usize {
        self.state().pending
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve once no job is pending or running.
    pub async fn wait_idle(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = receiver.wait_for(QueueState::is_idle).await;
    }
}

impl Default for SequentialJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<BoxedJob>,
    state: Arc<watch::Sender<QueueState>>,
    job_timeout: Option<Duration>,
) {
    while let Some(job) = receiver.recv().await {
        state.send_modify(|state| {
            state.pending -= 1;
            state.running = true;
        });

        let (signal, completion, task) = CompletionSignal::new();

        if catch_unwind(AssertUnwindSafe(move || job.start(signal))).is_err() {
            error!("Job panicked while starting");
        }

        let outcome = wait_for_completion(completion, job_timeout).await;
        match &outcome {
            JobOutcome::Completed => debug!("Job completed"),
            JobOutcome::Failed(reason) => warn!(reason = %reason, "Job failed"),
            JobOutcome::Abandoned => warn!("Job dropped its completion signal"),
            JobOutcome::TimedOut => {
                warn!(
                    timeout_ms = job_timeout.map(|t| t.as_millis() as u64),
                    "Job did not signal completion in time, releasing queue"
                );
                abort_task(&task).await;
            }
        }

        state.send_modify(|state| {
            state.running = false;
            state.completed += 1;
        });
    }

    debug!("Job queue worker stopped");
}

async fn wait_for_completion(
    completion: oneshot::Receiver<std::result::Result<(), String>>,
    job_timeout: Option<Duration>,
) -> JobOutcome {
    let received = match job_timeout {
        Some(timeout) => match tokio::time::timeout(timeout, completion).await {
            Ok(received) => received,
            Err(_) => return JobOutcome::TimedOut,
        },
        None => completion.await,
    };

    match received {
        Ok(Ok(())) => JobOutcome::Completed,
        Ok(Err(reason)) => JobOutcome::Failed(reason),
        Err(_) => JobOutcome::Abandoned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_into_idle_queue_starts_job() {
        let queue = SequentialJobQueue::new();
        let (started_tx, started_rx) = oneshot::channel();

        queue
            .enqueue(move |done: CompletionSignal| {
                let _ = started_tx.send(());
                done.done();
            })
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), started_rx)
            .await
            .expect("job should start without any external trigger")
            .unwrap();
        queue.wait_idle().await;
        assert_eq!(queue.state().completed, 1);
    }

    #[tokio::test]
    async fn test_state_tracks_running_and_pending() {
        let queue = SequentialJobQueue::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        queue
            .enqueue(move |done: CompletionSignal| {
                tokio::spawn(async move {
                    let _ = release_rx.await;
                    done.done();
                });
            })
            .unwrap();
        queue.enqueue(|done: CompletionSignal| done.done()).unwrap();

        let mut state = queue.state.subscribe();
        state.wait_for(|s| s.running).await.unwrap();
        assert!(queue.is_busy());
        assert_eq!(queue.len(), 1);

        release_tx.send(()).unwrap();
        queue.wait_idle().await;
        assert!(queue.is_empty());
        assert_eq!(queue.state().completed, 2);
    }

    #[tokio::test]
    async fn test_abort_task_stops_attached_task() {
        let (signal, _receiver, slot) = CompletionSignal::new();
        let (dropped_tx, dropped_rx) = oneshot::channel::<()>();

        struct NotifyOnDrop(Option<oneshot::Sender<()>>);
        impl Drop for NotifyOnDrop {
            fn drop(&mut self) {
                if let Some(tx) = self.0.take() {
                    let _ = tx.send(());
                }
            }
        }

        let job_task = signal.job_task();
        let guard = NotifyOnDrop(Some(dropped_tx));
        job_task.attach(tokio::spawn(async move {
            let _guard = guard;
            let _signal = signal;
            std::future::pending::<()>().await;
        }));

        abort_task(&slot).await;

        // The task's state, including its guard, is gone once abort_task returns.
        assert!(dropped_rx.await.is_ok());
        assert!(slot.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wait_for_completion_outcomes() {
        let (signal, receiver, _) = CompletionSignal::new();
        signal.fail("boom");
        assert_eq!(
            wait_for_completion(receiver, None).await,
            JobOutcome::Failed("boom".to_string())
        );

        let (signal, receiver, _) = CompletionSignal::new();
        drop(signal);
        assert_eq!(
            wait_for_completion(receiver, None).await,
            JobOutcome::Abandoned
        );

        let (_signal, receiver, _) = CompletionSignal::new();
        assert_eq!(
            wait_for_completion(receiver, Some(Duration::from_millis(10))).await,
            JobOutcome::TimedOut
        );
    }
}
