use indicatif::ProgressBar;
use ribosheet::workflows::error::WorkflowError;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("worker panicked: {0}")]
    Panicked(String),
}

#[derive(Debug)]
pub struct JobReport<T> {
    pub job: usize,
    pub result: Result<T, JobError>,
}

/// Runs `work` for every job id in `0..jobs` with at most `processes` jobs in flight.
///
/// Jobs report through a channel as they finish; every worker is joined before returning.
/// Failures are logged with their job id and never retried. Reports come back sorted by job.
pub async fn run_pool<T, F>(
    jobs: usize,
    processes: usize,
    progress: &ProgressBar,
    work: F,
) -> Vec<JobReport<T>>
where
    T: Send + 'static,
    F: Fn(usize) -> Result<T, WorkflowError> + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let semaphore = Arc::new(Semaphore::new(processes.max(1)));
    let (sender, mut receiver) = mpsc::channel(jobs.max(1));
    let mut workers = JoinSet::new();

    for job in 0..jobs {
        let work = Arc::clone(&work);
        let semaphore = Arc::clone(&semaphore);
        let sender = sender.clone();
        workers.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                warn!(job, "Worker pool closed before the job started.");
                return;
            };
            debug!(job, "Job started.");
            let result = match task::spawn_blocking(move || work(job)).await {
                Ok(result) => result.map_err(JobError::from),
                Err(e) => Err(JobError::Panicked(e.to_string())),
            };
            if sender.send(JobReport { job, result }).await.is_err() {
                warn!(job, "Result channel closed before the job reported.");
            }
        });
    }
    drop(sender);

    let mut reports = Vec::with_capacity(jobs);
    while let Some(report) = receiver.recv().await {
        match &report.result {
            Ok(_) => info!(job = report.job, "Job completed."),
            Err(e) => error!(job = report.job, error = %e, "Job failed."),
        }
        progress.inc(1);
        reports.push(report);
    }
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Worker task aborted.");
        }
    }
    progress.finish_and_clear();

    reports.sort_by_key(|report| report.job);
    reports
}
