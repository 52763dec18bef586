use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_core::Stream;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, error, info, warn};

use crate::error::{JobError, QueueError, QueueResult};
use crate::job::Job;
use crate::limiter::RateLimiter;
use crate::queue::PendingQueue;
use crate::retry::RetryPolicy;
use crate::types::{JobId, JobPriority, JobStatus, QueueConfig, QueueEvent, QueueStats, QueuedJob};

/// Type alias for boxed streams (stable Rust compatible)
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

/// How often shutdown re-checks the active set while draining
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Priority-ordered, rate-limited job queue engine
///
/// The engine owns every submitted job until it reaches a terminal state,
/// runs executions concurrently up to the configured cap, and emits a typed
/// [`QueueEvent`] for every state transition. All shared state lives behind
/// a single mutex; execution completions, the dispatch tick, the retry
/// promotion scan and the public API all funnel through it.
///
/// Cloning the engine is cheap and yields another handle to the same queue.
pub struct QueueEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: QueueConfig,
    retry_policy: RetryPolicy,
    state: Mutex<EngineState>,
    events: broadcast::Sender<QueueEvent>,
    paused: AtomicBool,
    started: AtomicBool,
    shutting_down: AtomicBool,
    started_at: DateTime<Utc>,
    shutdown_tx: watch::Sender<bool>,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

struct EngineState {
    /// One record per job id; the single source of truth
    jobs: HashMap<JobId, QueuedJob>,
    pending: PendingQueue,
    active: HashSet<JobId>,
    completed: Vec<JobId>,
    failed: Vec<JobId>,
    dead_letter: Vec<JobId>,
    limiter: RateLimiter,
    total_processed: u64,
    total_processing: Duration,
}

impl QueueEngine {
    /// Create a new engine with the given configuration
    ///
    /// Fails only on an invalid configuration. The engine starts idle;
    /// call [`start`](Self::start) to spawn the dispatch and retry timers.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;

        let (events, _) = broadcast::channel(config.event_buffer);
        let (shutdown_tx, _) = watch::channel(false);
        let retry_policy = RetryPolicy::new(config.retry_delay_base, config.max_retry_delay);
        let limiter = RateLimiter::new(config.rate_limit_per_second);

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                retry_policy,
                state: Mutex::new(EngineState {
                    jobs: HashMap::new(),
                    pending: PendingQueue::new(),
                    active: HashSet::new(),
                    completed: Vec::new(),
                    failed: Vec::new(),
                    dead_letter: Vec::new(),
                    limiter,
                    total_processed: 0,
                    total_processing: Duration::ZERO,
                }),
                events,
                paused: AtomicBool::new(false),
                started: AtomicBool::new(false),
                shutting_down: AtomicBool::new(false),
                started_at: Utc::now(),
                shutdown_tx,
                timers: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Spawn the dispatch tick and retry promotion timers
    ///
    /// Idempotent; a no-op after shutdown. Jobs may be added before
    /// starting - they accumulate in the pending queue.
    pub fn start(&self) {
        if self.inner.shutting_down.load(Ordering::SeqCst)
            || self.inner.started.swap(true, Ordering::SeqCst)
        {
            return;
        }

        let dispatch = {
            let inner = Arc::clone(&self.inner);
            let mut shutdown_rx = self.inner.shutdown_tx.subscribe();
            tokio::spawn(async move {
                let mut ticker = interval(inner.config.dispatch_interval);
                loop {
                    tokio::select! {
                        _ = shutdown_rx.changed() => break,
                        _ = ticker.tick() => { EngineInner::dispatch_tick(&inner); }
                    }
                }
                debug!(queue = %inner.config.name, "dispatch loop stopped");
            })
        };

        let promotion = {
            let inner = Arc::clone(&self.inner);
            let mut shutdown_rx = self.inner.shutdown_tx.subscribe();
            tokio::spawn(async move {
                let mut ticker = interval(inner.config.retry_scan_interval);
                loop {
                    tokio::select! {
                        _ = shutdown_rx.changed() => break,
                        _ = ticker.tick() => { inner.retry_tick(); }
                    }
                }
                debug!(queue = %inner.config.name, "retry promotion loop stopped");
            })
        };

        self.inner.timers.lock().extend([dispatch, promotion]);
        info!(queue = %self.inner.config.name, "queue engine started");
    }

    /// Submit a job for execution
    pub fn add_job<J: Job>(&self, job: J) -> QueueResult<JobId> {
        self.add_shared_job(Arc::new(job), None)
    }

    /// Submit a job with opaque submitter metadata attached to its record
    pub fn add_job_with_metadata<J: Job>(
        &self,
        job: J,
        metadata: serde_json::Value,
    ) -> QueueResult<JobId> {
        self.add_shared_job(Arc::new(job), Some(metadata))
    }

    /// Submit an already-shared job
    ///
    /// Fails if the queue is shut down, the id is empty, or a record with
    /// the same id already exists (duplicates are rejected, never
    /// overwritten).
    pub fn add_shared_job(
        &self,
        job: Arc<dyn Job>,
        metadata: Option<serde_json::Value>,
    ) -> QueueResult<JobId> {
        if self.inner.shutting_down.load(Ordering::SeqCst) {
            return Err(QueueError::ShutDown);
        }
        let job_id = job.id();
        if job_id.is_empty() {
            return Err(QueueError::EmptyJobId);
        }

        let mut state = self.inner.state.lock();
        if state.jobs.contains_key(&job_id) {
            return Err(QueueError::DuplicateJob(job_id.to_string()));
        }

        let record = QueuedJob::new(job, metadata);
        let priority = record.priority();
        let job_type = record.job_type();
        state.jobs.insert(job_id.clone(), record);
        state.pending.insert(job_id.clone(), priority);

        self.inner.emit(QueueEvent::JobAdded {
            queue: self.inner.config.name.clone(),
            job_id: job_id.clone(),
            job_type: job_type.clone(),
            priority,
            at: Utc::now(),
        });
        self.inner.emit_queue_changed(&state);
        debug!(
            queue = %self.inner.config.name,
            job_id = %job_id,
            job_type = %job_type,
            priority = priority.value(),
            "job added"
        );
        Ok(job_id)
    }

    /// Cancel a pending or retrying job
    ///
    /// Removes it from the pending queue, marks it failed, and runs the
    /// job's cancellation hook. Returns `false` for active, terminal or
    /// unknown jobs - an in-flight execution is never interrupted.
    pub async fn cancel_job(&self, job_id: &JobId) -> bool {
        let job = {
            let mut state = self.inner.state.lock();
            let Some(record) = state.jobs.get_mut(job_id) else {
                return false;
            };
            if !record.status.is_cancellable() {
                return false;
            }
            record.fail("cancelled".to_string());
            let job = Arc::clone(&record.job);
            let job_type = record.job_type();
            state.pending.remove(job_id);
            state.failed.push(job_id.clone());

            self.inner.emit(QueueEvent::JobCancelled {
                queue: self.inner.config.name.clone(),
                job_id: job_id.clone(),
                job_type,
                at: Utc::now(),
            });
            self.inner.emit_queue_changed(&state);
            job
        };

        job.on_cancel().await;
        info!(queue = %self.inner.config.name, job_id = %job_id, "job cancelled");
        true
    }

    /// Stop dispatching new jobs; in-flight executions continue. Idempotent.
    pub fn pause(&self) {
        if !self.inner.paused.swap(true, Ordering::SeqCst) {
            self.inner.emit(QueueEvent::QueuePaused {
                queue: self.inner.config.name.clone(),
                at: Utc::now(),
            });
            info!(queue = %self.inner.config.name, "queue paused");
        }
    }

    /// Resume dispatching. Idempotent.
    pub fn resume(&self) {
        if self.inner.paused.swap(false, Ordering::SeqCst) {
            self.inner.emit(QueueEvent::QueueResumed {
                queue: self.inner.config.name.clone(),
                at: Utc::now(),
            });
            info!(queue = %self.inner.config.name, "queue resumed");
        }
    }

    /// Remove all completed records from the queue; returns the count removed
    pub fn clear_completed(&self) -> usize {
        let mut state = self.inner.state.lock();
        let drained: Vec<JobId> = state.completed.drain(..).collect();
        for job_id in &drained {
            state.jobs.remove(job_id);
        }
        if !drained.is_empty() {
            self.inner.emit_queue_changed(&state);
        }
        drained.len()
    }

    /// Remove all dead-lettered records; returns the count removed
    ///
    /// Dead-lettered jobs are retained for inspection until purged
    /// explicitly - there is no automatic eviction.
    pub fn purge_dead_letter(&self) -> usize {
        let mut state = self.inner.state.lock();
        let drained: Vec<JobId> = state.dead_letter.drain(..).collect();
        for job_id in &drained {
            state.jobs.remove(job_id);
        }
        if !drained.is_empty() {
            self.inner.emit_queue_changed(&state);
        }
        drained.len()
    }

    /// Snapshot the dead-letter list for inspection
    pub fn dead_letter_jobs(&self) -> Vec<QueuedJob> {
        let state = self.inner.state.lock();
        state
            .dead_letter
            .iter()
            .filter_map(|job_id| state.jobs.get(job_id).cloned())
            .collect()
    }

    /// Shut the queue down, waiting for active jobs to drain
    ///
    /// Stops accepting submissions, stops both timers, then polls the
    /// active set until it is empty or the configured shutdown timeout
    /// elapses. In-flight jobs are never forcibly cancelled. Idempotent.
    pub async fn shutdown(&self) {
        if self.inner.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(queue = %self.inner.config.name, "queue shutting down");

        let _ = self.inner.shutdown_tx.send(true);
        let handles: Vec<JoinHandle<()>> = self.inner.timers.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }

        let deadline = Instant::now() + self.inner.config.shutdown_timeout;
        loop {
            let active = self.inner.state.lock().active.len();
            if active == 0 {
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    queue = %self.inner.config.name,
                    active,
                    "shutdown timeout reached with jobs still active"
                );
                break;
            }
            tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
        }

        let (pending, active) = {
            let state = self.inner.state.lock();
            (state.pending.len(), state.active.len())
        };
        self.inner.emit(QueueEvent::QueueShutdown {
            queue: self.inner.config.name.clone(),
            pending,
            active,
            at: Utc::now(),
        });
        info!(queue = %self.inner.config.name, pending, active, "queue shut down");
    }

    /// Compute a point-in-time statistics snapshot
    pub fn stats(&self) -> QueueStats {
        let state = self.inner.state.lock();
        let mut pending = 0;
        let mut active = 0;
        let mut completed = 0;
        let mut failed = 0;
        let mut retrying = 0;
        let mut dead = 0;
        for record in state.jobs.values() {
            match record.status {
                JobStatus::Pending => pending += 1,
                JobStatus::Active => active += 1,
                JobStatus::Completed => completed += 1,
                JobStatus::Failed => failed += 1,
                JobStatus::Retrying => retrying += 1,
                JobStatus::Dead => dead += 1,
            }
        }
        let average_processing_time = if state.total_processed > 0 {
            state.total_processing / state.total_processed as u32
        } else {
            Duration::ZERO
        };
        QueueStats {
            name: self.inner.config.name.clone(),
            pending,
            active,
            completed,
            failed,
            retrying,
            dead,
            total_processed: state.total_processed,
            average_processing_time,
            uptime: (Utc::now() - self.inner.started_at)
                .to_std()
                .unwrap_or_default(),
        }
    }

    /// Look up a job record by id
    pub fn get_job(&self, job_id: &JobId) -> Option<QueuedJob> {
        self.inner.state.lock().jobs.get(job_id).cloned()
    }

    /// Subscribe to the lifecycle event stream
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    /// Lifecycle events as a stream (lagged receivers skip missed events)
    pub fn event_stream(&self) -> BoxStream<QueueEvent> {
        use tokio_stream::{wrappers::BroadcastStream, StreamExt};
        let receiver = self.inner.events.subscribe();
        Box::pin(BroadcastStream::new(receiver).filter_map(|result| result.ok()))
    }

    /// Queue name
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Engine configuration
    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Whether dispatch is currently paused
    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    /// Whether the queue has been shut down
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    /// Run one dispatch tick manually (driver/test helper)
    ///
    /// Returns whether a job was started. Must run inside a tokio runtime;
    /// the started execution is spawned, not awaited.
    pub fn run_dispatch_tick(&self) -> bool {
        EngineInner::dispatch_tick(&self.inner)
    }

    /// Run one retry promotion scan manually (driver/test helper)
    ///
    /// Returns the number of jobs promoted back to pending.
    pub fn run_retry_tick(&self) -> usize {
        self.inner.retry_tick()
    }

    /// Make a retrying job immediately due (test helper)
    pub fn force_retry_due(&self, job_id: &JobId) -> bool {
        let mut state = self.inner.state.lock();
        match state.jobs.get_mut(job_id) {
            Some(record) if record.status == JobStatus::Retrying => {
                record.next_retry_at = Some(Utc::now() - chrono::Duration::seconds(1));
                true
            }
            _ => false,
        }
    }
}

impl Clone for QueueEngine {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl EngineInner {
    fn emit(&self, event: QueueEvent) {
        let _ = self.events.send(event);
    }

    fn emit_queue_changed(&self, state: &EngineState) {
        self.emit(QueueEvent::QueueChanged {
            queue: self.config.name.clone(),
            pending: state.pending.len(),
            active: state.active.len(),
            at: Utc::now(),
        });
    }

    /// One dispatch decision: admit at most one pending job into execution
    fn dispatch_tick(inner: &Arc<Self>) -> bool {
        if inner.paused.load(Ordering::SeqCst) || inner.shutting_down.load(Ordering::SeqCst) {
            return false;
        }

        let (job, job_id, job_type) = {
            let mut state = inner.state.lock();
            state.limiter.refill();
            if state.active.len() >= inner.config.max_concurrency {
                return false;
            }
            if state.pending.is_empty() {
                return false;
            }
            if !state.limiter.try_acquire() {
                return false;
            }
            let Some(job_id) = state.pending.pop_highest() else {
                return false;
            };
            let Some(record) = state.jobs.get_mut(&job_id) else {
                return false;
            };
            record.start_processing();
            let job = Arc::clone(&record.job);
            let job_type = record.job_type();
            let attempt = record.attempt();
            state.active.insert(job_id.clone());

            inner.emit(QueueEvent::JobProcessing {
                queue: inner.config.name.clone(),
                job_id: job_id.clone(),
                job_type: job_type.clone(),
                attempt,
                at: Utc::now(),
            });
            inner.emit_queue_changed(&state);
            (job, job_id, job_type)
        };

        debug!(queue = %inner.config.name, job_id = %job_id, "dispatching job");
        let task_inner = Arc::clone(inner);
        tokio::spawn(async move {
            task_inner.execute_job(job, job_id, job_type).await;
        });
        true
    }

    /// Run one execution to completion and commit its outcome
    async fn execute_job(self: Arc<Self>, job: Arc<dyn Job>, job_id: JobId, job_type: String) {
        let started = Instant::now();
        let result = match self.config.processing_timeout {
            Some(limit) => match tokio::time::timeout(limit, job.execute()).await {
                Ok(result) => result,
                Err(_) => Err(JobError::TimedOut(limit)),
            },
            None => job.execute().await,
        };
        let duration = started.elapsed();

        match result {
            Ok(()) => self.finish_success(&job_id, &job_type, duration),
            Err(job_error) => self.finish_failure(&job, &job_id, &job_type, duration, job_error),
        }
    }

    fn finish_success(&self, job_id: &JobId, job_type: &str, duration: Duration) {
        let mut state = self.state.lock();
        state.active.remove(job_id);
        if let Some(record) = state.jobs.get_mut(job_id) {
            record.complete();
        }
        state.completed.push(job_id.clone());
        state.total_processed += 1;
        state.total_processing += duration;

        self.emit(QueueEvent::JobCompleted {
            queue: self.config.name.clone(),
            job_id: job_id.clone(),
            job_type: job_type.to_string(),
            success: true,
            duration_ms: duration.as_millis() as u64,
            at: Utc::now(),
        });
        self.emit_queue_changed(&state);
        info!(
            queue = %self.config.name,
            job_id = %job_id,
            job_type,
            duration_ms = duration.as_millis() as u64,
            "job completed"
        );
    }

    fn finish_failure(
        &self,
        job: &Arc<dyn Job>,
        job_id: &JobId,
        job_type: &str,
        duration: Duration,
        job_error: JobError,
    ) {
        let mut state = self.state.lock();
        state.active.remove(job_id);
        let Some(record) = state.jobs.get_mut(job_id) else {
            return;
        };
        record.retry_count += 1;
        let attempt = record.retry_count;
        let error_text = job_error.to_string();
        // Total attempt budget is the initial execution plus max_retries retries.
        let max_attempts = job.max_retries().unwrap_or(self.config.max_retries) + 1;
        let retry = self.retry_policy.should_retry(&job_error, attempt, max_attempts)
            && job.should_retry(&job_error, attempt);

        if retry {
            let delay = self.retry_policy.compute_delay(attempt);
            let retry_at = Utc::now() + chrono::Duration::milliseconds(delay.as_millis() as i64);
            record.schedule_retry(retry_at, error_text.clone());

            self.emit(QueueEvent::JobRetrying {
                queue: self.config.name.clone(),
                job_id: job_id.clone(),
                job_type: job_type.to_string(),
                attempt,
                retry_at,
                error: error_text.clone(),
                at: Utc::now(),
            });
            self.emit_queue_changed(&state);
            warn!(
                queue = %self.config.name,
                job_id = %job_id,
                job_type,
                attempt,
                error = %error_text,
                "job failed, retry scheduled"
            );
            return;
        }

        record.fail(error_text.clone());
        let dead_lettered = self.config.enable_dead_letter_queue;
        if dead_lettered {
            record.mark_dead();
            state.dead_letter.push(job_id.clone());
        } else {
            state.failed.push(job_id.clone());
        }
        state.total_processed += 1;
        state.total_processing += duration;

        self.emit(QueueEvent::JobFailed {
            queue: self.config.name.clone(),
            job_id: job_id.clone(),
            job_type: job_type.to_string(),
            error: error_text.clone(),
            final_failure: true,
            at: Utc::now(),
        });
        self.emit(QueueEvent::JobCompleted {
            queue: self.config.name.clone(),
            job_id: job_id.clone(),
            job_type: job_type.to_string(),
            success: false,
            duration_ms: duration.as_millis() as u64,
            at: Utc::now(),
        });
        self.emit_queue_changed(&state);
        error!(
            queue = %self.config.name,
            job_id = %job_id,
            job_type,
            dead_lettered,
            error = %error_text,
            "job failed permanently"
        );
    }

    /// Promote retrying jobs whose delay has elapsed back to pending
    fn retry_tick(&self) -> usize {
        if self.shutting_down.load(Ordering::SeqCst) {
            return 0;
        }
        let mut state = self.state.lock();
        let now = Utc::now();
        let due: Vec<(JobId, JobPriority)> = state
            .jobs
            .iter()
            .filter(|(_, record)| record.retry_due(now))
            .map(|(job_id, record)| (job_id.clone(), record.priority()))
            .collect();

        for (job_id, priority) in &due {
            if let Some(record) = state.jobs.get_mut(job_id) {
                record.promote();
            }
            // Retries re-enter at their original priority, never elevated.
            state.pending.insert(job_id.clone(), *priority);
            debug!(queue = %self.config.name, job_id = %job_id, "retry promoted to pending");
        }
        if !due.is_empty() {
            self.emit_queue_changed(&state);
        }
        due.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    struct StubJob {
        id: JobId,
    }

    impl StubJob {
        fn new(id: &str) -> Self {
            Self { id: JobId::from(id) }
        }
    }

    #[async_trait]
    impl Job for StubJob {
        fn id(&self) -> JobId {
            self.id.clone()
        }

        fn job_type(&self) -> &str {
            "stub"
        }

        async fn execute(&self) -> Result<(), JobError> {
            Ok(())
        }
    }

    fn engine() -> QueueEngine {
        QueueEngine::new(QueueConfig::new("test")).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = QueueConfig::new("test").with_max_concurrency(0);
        assert!(matches!(
            QueueEngine::new(config),
            Err(QueueError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn rejects_duplicate_ids() {
        let engine = engine();
        engine.add_job(StubJob::new("a")).unwrap();
        let result = engine.add_job(StubJob::new("a"));
        assert_eq!(result, Err(QueueError::DuplicateJob("a".to_string())));
    }

    #[tokio::test]
    async fn rejects_empty_id() {
        let engine = engine();
        assert_eq!(engine.add_job(StubJob::new("")), Err(QueueError::EmptyJobId));
    }

    #[tokio::test]
    async fn rejects_submissions_after_shutdown() {
        let engine = engine();
        engine.shutdown().await;
        assert_eq!(engine.add_job(StubJob::new("a")), Err(QueueError::ShutDown));
    }

    #[tokio::test]
    async fn pause_and_resume_are_idempotent() {
        let engine = engine();
        let mut events = engine.subscribe();

        engine.pause();
        engine.pause();
        engine.resume();
        engine.resume();

        assert_eq!(events.recv().await.unwrap().event_name(), "queue_paused");
        assert_eq!(events.recv().await.unwrap().event_name(), "queue_resumed");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn paused_engine_does_not_dispatch() {
        let engine = engine();
        engine.add_job(StubJob::new("a")).unwrap();
        engine.pause();
        assert!(!engine.run_dispatch_tick());
        engine.resume();
        assert!(engine.run_dispatch_tick());
    }

    #[tokio::test]
    async fn stats_on_idle_queue() {
        let engine = engine();
        let stats = engine.stats();
        assert_eq!(stats.total_jobs(), 0);
        assert_eq!(stats.total_processed, 0);
        assert_eq!(stats.average_processing_time, Duration::ZERO);
    }

    #[tokio::test]
    async fn dispatch_respects_concurrency_cap() {
        struct HangingJob {
            id: JobId,
        }

        #[async_trait]
        impl Job for HangingJob {
            fn id(&self) -> JobId {
                self.id.clone()
            }

            fn job_type(&self) -> &str {
                "hanging"
            }

            async fn execute(&self) -> Result<(), JobError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        let engine = QueueEngine::new(
            QueueConfig::new("test").with_max_concurrency(2),
        )
        .unwrap();
        for n in 0..4 {
            engine
                .add_job(HangingJob { id: JobId::from(format!("h-{n}")) })
                .unwrap();
        }

        assert!(engine.run_dispatch_tick());
        assert!(engine.run_dispatch_tick());
        assert!(!engine.run_dispatch_tick());
        assert_eq!(engine.stats().active, 2);
        assert_eq!(engine.stats().pending, 2);
    }

    #[tokio::test]
    async fn custom_retry_predicate_is_consulted() {
        struct PickyJob {
            attempts: AtomicU32,
        }

        #[async_trait]
        impl Job for PickyJob {
            fn id(&self) -> JobId {
                JobId::from("picky")
            }

            fn job_type(&self) -> &str {
                "picky"
            }

            async fn execute(&self) -> Result<(), JobError> {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                Err(JobError::retryable("flaky"))
            }

            fn should_retry(&self, _error: &JobError, _attempt: u32) -> bool {
                false
            }
        }

        let engine = engine();
        let job_id = engine
            .add_job(PickyJob { attempts: AtomicU32::new(0) })
            .unwrap();

        assert!(engine.run_dispatch_tick());
        // Retryable error, budget remaining, but the job's own predicate
        // vetoes the retry.
        let record = wait_for_terminal(&engine, &job_id).await;
        assert_eq!(record.status, JobStatus::Dead);
        assert_eq!(record.retry_count, 1);
    }

    async fn wait_for_terminal(engine: &QueueEngine, job_id: &JobId) -> QueuedJob {
        for _ in 0..200 {
            if let Some(record) = engine.get_job(job_id) {
                if record.status.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {job_id} never reached a terminal state");
    }
}
