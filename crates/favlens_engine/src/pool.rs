use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_trace};
use favlens_core::{CandidateJob, ComparisonVerdict, JobId, Stage, DEFAULT_WORKERS};
use futures_util::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::normalize::{normalize_image, NormalizedImage};
use crate::ollama::Comparator;
use crate::{Fetcher, JobError, JobResult};

#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Number of workers; values below 1 are raised to 1.
    pub concurrency: usize,
    /// Pause before every candidate fetch.
    pub delay: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_WORKERS,
            delay: Duration::ZERO,
        }
    }
}

/// Fixed set of interchangeable workers draining one job queue.
///
/// Each worker runs fetch, normalize and compare for one job at a time and
/// emits exactly one [`JobResult`] per job. The result stream closes once the
/// last worker has exited.
pub struct WorkerPool {
    context: Arc<WorkerContext>,
    concurrency: usize,
}

struct WorkerContext {
    fetcher: Arc<dyn Fetcher>,
    comparator: Arc<dyn Comparator>,
    reference: NormalizedImage,
    delay: Duration,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<CandidateJob>>>;

impl WorkerPool {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        comparator: Arc<dyn Comparator>,
        reference: NormalizedImage,
        settings: PoolSettings,
    ) -> Self {
        Self {
            context: Arc::new(WorkerContext {
                fetcher,
                comparator,
                reference,
                delay: settings.delay,
            }),
            concurrency: settings.concurrency.max(1),
        }
    }

    /// Starts the workers on the current runtime and returns the result stream.
    ///
    /// Jobs are queued in the given order; results arrive in completion order.
    pub fn run(self, jobs: Vec<CandidateJob>) -> mpsc::Receiver<JobResult> {
        let capacity = self.concurrency * 2;
        let (job_tx, job_rx) = mpsc::channel::<CandidateJob>(capacity);
        let (result_tx, result_rx) = mpsc::channel::<JobResult>(capacity);
        let queue: JobQueue = Arc::new(Mutex::new(job_rx));

        tokio::spawn(async move {
            let total = jobs.len();
            for job in jobs {
                if job_tx.send(job).await.is_err() {
                    break;
                }
            }
            engine_info!("Dispatched {} jobs to workers", total);
            // job_tx drops here, closing the queue.
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..self.concurrency {
            workers.spawn(worker_loop(
                worker_id,
                self.context.clone(),
                queue.clone(),
                result_tx.clone(),
            ));
        }
        drop(result_tx);

        tokio::spawn(async move {
            while let Some(joined) = workers.join_next().await {
                if let Err(err) = joined {
                    engine_error!("Worker task failed: {}", err);
                }
            }
            engine_info!("All workers finished");
        });

        result_rx
    }
}

async fn worker_loop(
    worker_id: usize,
    context: Arc<WorkerContext>,
    queue: JobQueue,
    results: mpsc::Sender<JobResult>,
) {
    engine_trace!("Worker {} started", worker_id);
    let mut processed = 0usize;
    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        processed += 1;
        engine_trace!(
            "Worker {} processing job {}: {}",
            worker_id,
            processed,
            job.url
        );

        let (job_id, url) = (job.id, job.url.clone());
        let result = match AssertUnwindSafe(context.process(job)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                engine_error!("Worker {} panicked on job {}: {}", worker_id, job_id, message);
                JobResult {
                    job_id,
                    url,
                    outcome: Err(JobError::Panicked(message)),
                }
            }
        };
        if results.send(result).await.is_err() {
            break;
        }
    }
    engine_trace!(
        "Worker {} finished, processed {} jobs",
        worker_id,
        processed
    );
}

impl WorkerContext {
    async fn process(&self, job: CandidateJob) -> JobResult {
        let outcome = self.run_stages(&job).await;
        let result = JobResult {
            job_id: job.id,
            url: job.url,
            outcome,
        };
        engine_trace!(
            "Job {} finished as {:?}",
            result.job_id,
            Stage::from(result.kind())
        );
        result
    }

    async fn run_stages(&self, job: &CandidateJob) -> Result<ComparisonVerdict, JobError> {
        let mut stage = Stage::Queued;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        advance(job.id, &mut stage, Stage::Fetching);
        let fetched = self.fetcher.fetch(&job.url).await?;

        advance(job.id, &mut stage, Stage::Normalizing);
        let candidate = normalize_image(&fetched.bytes)?;
        engine_trace!(
            "Job {} decoded {:?} image {:?}",
            job.id,
            candidate.source_format(),
            candidate.dimensions()
        );

        advance(job.id, &mut stage, Stage::Comparing);
        let verdict = self.comparator.compare(&self.reference, &candidate).await?;
        Ok(verdict)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn advance(job_id: JobId, stage: &mut Stage, next: Stage) {
    debug_assert!(stage.can_advance_to(next), "{stage:?} -> {next:?}");
    engine_trace!("Job {} {:?} -> {:?}", job_id, stage, next);
    *stage = next;
}
