//! Bounded-concurrency task execution
//!
//! Workers pull tasks from a shared queue and send one [`ExtractionResult`]
//! per task over a channel. A single accounting loop consumes the channel,
//! so the counters need no lock.

use crate::{
    persist, Counters, Job, PipelineConfig, PipelineError, ProgressSink, RetryPolicy, TaskError,
    Throttle,
};
use regula_domain::{ExtractionResult, Task};
use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

type TaskQueue = Arc<Mutex<VecDeque<Task>>>;

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Final counters
    pub counters: Counters,

    /// Tasks handed to the workers
    pub dispatched: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Failed results, in completion order
    pub failures: Vec<ExtractionResult>,
}

impl RunSummary {
    /// Every dispatched task produced exactly one result
    pub fn is_reconciled(&self) -> bool {
        self.counters.completed() == self.dispatched
    }
}

/// Runs a [`Job`] over a batch of tasks
pub struct Pipeline<J: Job> {
    job: Arc<J>,
    config: PipelineConfig,
    throttle: Throttle,
}

impl<J: Job> Pipeline<J> {
    /// Create a pipeline, pacing calls according to the configuration
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` for a configuration that cannot run.
    pub fn new(job: J, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let throttle = Throttle::from_config(&config);
        Ok(Self {
            job: Arc::new(job),
            config,
            throttle,
        })
    }

    /// Replace the pacing chosen from the configuration
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// The job run for every task
    pub fn job(&self) -> &J {
        &self.job
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every task to completion
    ///
    /// `skipped` seeds the counters with what discovery already skipped.
    /// Task failures are counted and reported, never propagated.
    pub async fn run<S: ProgressSink>(
        &self,
        tasks: Vec<Task>,
        skipped: usize,
        sink: &mut S,
    ) -> RunSummary {
        let started = Instant::now();
        let dispatched = tasks.len();
        let mut counters = Counters::new(skipped);
        let mut failures = Vec::new();

        if tasks.is_empty() {
            info!(skipped, "Nothing to process");
            return RunSummary {
                counters,
                dispatched,
                elapsed: started.elapsed(),
                failures,
            };
        }

        let workers = self.config.concurrency.min(dispatched);
        info!(
            tasks = dispatched,
            workers,
            throttle = ?self.throttle,
            "Starting pipeline run"
        );

        let queue: TaskQueue = Arc::new(Mutex::new(VecDeque::from(tasks)));
        let (tx, mut rx) = mpsc::channel(workers);
        let policy = self.config.retry_policy();

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&queue),
                    tx.clone(),
                    Arc::clone(&self.job),
                    policy,
                    self.throttle.clone(),
                ))
            })
            .collect();
        drop(tx);

        while let Some(result) = rx.recv().await {
            counters.record(&result);
            sink.on_result(&result, &counters, dispatched);
            if !result.is_success() {
                failures.push(result);
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker ended abnormally");
            }
        }

        // Tasks still queued here were lost with a worker
        let stranded: Vec<Task> = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in stranded {
            let result = ExtractionResult::failure(task.id, "Task was never run", 0);
            counters.record(&result);
            sink.on_result(&result, &counters, dispatched);
            failures.push(result);
        }

        let elapsed = started.elapsed();
        info!(
            processed = counters.processed,
            skipped = counters.skipped,
            errors = counters.errors,
            elapsed_ms = elapsed.as_millis() as u64,
            "Pipeline run finished"
        );

        RunSummary {
            counters,
            dispatched,
            elapsed,
            failures,
        }
    }
}

async fn worker_loop<J: Job>(
    worker_id: usize,
    queue: TaskQueue,
    results: mpsc::Sender<ExtractionResult>,
    job: Arc<J>,
    policy: RetryPolicy,
    throttle: Throttle,
) {
    debug!(worker_id, "Worker started");

    loop {
        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let Some(task) = next else {
            break;
        };

        let task_id = task.id.clone();
        let isolated = tokio::spawn(run_task(
            Arc::clone(&job),
            task,
            policy,
            throttle.clone(),
        ));
        let result = match isolated.await {
            Ok(result) => result,
            Err(e) => ExtractionResult::failure(task_id, join_failure(e), 0),
        };

        if results.send(result).await.is_err() {
            break;
        }
    }

    debug!(worker_id, "Worker finished");
}

async fn run_task<J: Job>(
    job: Arc<J>,
    task: Task,
    policy: RetryPolicy,
    throttle: Throttle,
) -> ExtractionResult {
    let request = match job.prepare(&task).await {
        Ok(request) => request,
        Err(e) => return ExtractionResult::failure(task.id, e.to_string(), 0),
    };

    throttle.before_task().await;

    let (called, attempts) = call_with_retry(job.as_ref(), &task, &request, &policy, &throttle).await;
    let outcome = match called {
        Ok(raw) => match job.finish(&task, &request, raw).await {
            Ok(content) => persist::write_atomic(&task.destination, content).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => ExtractionResult::success(task.id, attempts),
        Err(e) => ExtractionResult::failure(task.id, e.to_string(), attempts),
    }
}

/// Call the job until it succeeds, fails permanently or runs out of attempts
///
/// Returns the outcome with the number of calls made.
async fn call_with_retry<J: Job>(
    job: &J,
    task: &Task,
    request: &J::Request,
    policy: &RetryPolicy,
    throttle: &Throttle,
) -> (Result<String, TaskError>, u32) {
    let mut attempt = 0;

    loop {
        attempt += 1;
        throttle.before_call().await;

        let error = match job.call(task, request).await {
            Ok(raw) => return (Ok(raw), attempt),
            Err(e) => e,
        };

        if !error.kind.is_retryable() {
            return (Err(TaskError::Service(error)), attempt);
        }

        let Some(delay) = policy.backoff_for(error.kind, attempt) else {
            return (
                Err(TaskError::RetriesExhausted {
                    attempts: attempt,
                    last: error,
                }),
                attempt,
            );
        };

        warn!(
            task_id = %task.id,
            attempt,
            kind = error.kind.as_str(),
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Call failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

fn join_failure(e: JoinError) -> String {
    if !e.is_panic() {
        return format!("Task cancelled: {}", e);
    }
    let payload: Box<dyn Any + Send> = e.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("Task panicked: {}", message)
}
