//! Regula Pipeline
//!
//! Resilient batch execution shared by the transcription and rule stages.
//!
//! # Overview
//!
//! The pipeline is responsible for:
//! - **Dispatch**: a fixed pool of tokio workers pulling from one queue
//! - **Isolation**: each task runs in its own spawned task, so a panic becomes
//!   a failed result instead of a lost worker
//! - **Retry**: typed error kinds decide between growing backoff, fixed
//!   backoff and immediate failure
//! - **Pacing**: a per-task pause for one worker, a shared `governor` bucket
//!   for several
//! - **Persistence**: output is written atomically, only after validation
//! - **Accounting**: processed, skipped and error counters owned by a single
//!   loop
//!
//! # Usage
//!
//! ```no_run
//! use regula_pipeline::{Pipeline, PipelineConfig, TracingSink};
//! # use regula_pipeline::{Job, TaskError};
//! # use regula_domain::{ServiceError, Task};
//! # struct Echo;
//! # #[async_trait::async_trait]
//! # impl Job for Echo {
//! #     type Request = ();
//! #     async fn prepare(&self, _: &Task) -> Result<(), TaskError> { Ok(()) }
//! #     async fn call(&self, t: &Task, _: &()) -> Result<String, ServiceError> { Ok(t.id.clone()) }
//! #     async fn finish(&self, _: &Task, _: &(), raw: String) -> Result<String, TaskError> { Ok(raw) }
//! # }
//!
//! # async fn example(tasks: Vec<Task>) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(Echo, PipelineConfig::ocr())?;
//! let summary = pipeline.run(tasks, 0, &mut TracingSink).await;
//!
//! println!("{}", summary.counters.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod executor;
mod job;
mod metrics;
pub mod persist;
mod sink;
mod throttle;

pub use config::{PipelineConfig, PipelineOverrides, RetryPolicy};
pub use error::{PipelineError, TaskError};
pub use executor::{Pipeline, RunSummary};
pub use job::Job;
pub use metrics::Counters;
pub use sink::{CollectingSink, ProgressSink, TracingSink};
pub use throttle::Throttle;
