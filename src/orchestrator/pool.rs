use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::AppConfig;
use crate::driver::session::Session;
use crate::driver::traits::LoginFlow;
use crate::orchestrator::results::{ResultLog, RunSummary};
use crate::orchestrator::window::WindowOrchestrator;
use crate::tasks::table::DescriptorTable;

/// Fans one [`WindowOrchestrator`] run out per connected session over a
/// bounded worker pool and waits for all of them. Each worker exclusively
/// owns its session and closes it as its own final step, whatever the run's
/// outcome, so the coordinator never closes a session out from under a
/// running worker.
pub struct PoolCoordinator {
    site_url: String,
    task_types: Vec<crate::tasks::types::TaskType>,
    table: Arc<DescriptorTable>,
    runner_config: crate::config::RunnerConfig,
    max_workers: usize,
    stop: Arc<AtomicBool>,
}

impl PoolCoordinator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            site_url: config.task_site_url.clone(),
            task_types: config.task_types.clone(),
            table: Arc::new(DescriptorTable::from_config(&config.tasks)),
            runner_config: config.runner.clone(),
            max_workers: config.pool.max_workers,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared stop flag; setting it makes in-flight waits wind down at their
    /// next deadline check instead of blocking.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub async fn run_all(
        &self,
        sessions: Vec<Session>,
        login: Arc<dyn LoginFlow>,
        results: Arc<ResultLog>,
    ) -> RunSummary {
        let pool_size = self.max_workers.min(sessions.len()).max(1);
        tracing::info!(
            sessions = sessions.len(),
            pool_size,
            run = %results.run_id(),
            "starting session pool"
        );

        let semaphore = Arc::new(Semaphore::new(pool_size));
        let mut workers = JoinSet::new();

        for session in sessions {
            let semaphore = Arc::clone(&semaphore);
            let login = Arc::clone(&login);
            let orchestrator = WindowOrchestrator::new(
                self.site_url.as_str(),
                self.task_types.clone(),
                Arc::clone(&self.table),
                self.runner_config.clone(),
                Arc::clone(&results),
                Arc::clone(&self.stop),
            );

            workers.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let session_id = session.id().to_string();

                if let Err(e) = orchestrator.run(&session, login.as_ref()).await {
                    tracing::error!(session = %session_id, error = %e, "session run aborted");
                }

                // Final step, reached on success and failure alike: the
                // session was opened, so it gets closed.
                if let Err(e) = session.close().await {
                    tracing::warn!(session = %session_id, error = %e, "session close failed");
                }
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "session worker panicked");
            }
        }

        let summary = results.summary().await;
        tracing::info!(
            successes = summary.successes,
            total = summary.total,
            stopped = self.stop.load(Ordering::Relaxed),
            "session pool drained"
        );
        summary
    }
}
