use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::RunnerConfig;
use crate::driver::session::Session;
use crate::driver::traits::LoginFlow;
use crate::errors::{TaskHiveError, TaskHiveResult};
use crate::orchestrator::results::ResultLog;
use crate::tasks::runner::{TaskRunner, Verdict};
use crate::tasks::table::DescriptorTable;
use crate::tasks::types::{TaskOutcome, TaskType};

/// Runs the configured task types, in order, on one exclusively-owned
/// session. Login is a hard gate; after it, each task type is isolated — a
/// failed type is recorded and the next one still runs.
#[derive(Clone)]
pub struct WindowOrchestrator {
    site_url: Arc<str>,
    task_types: Arc<[TaskType]>,
    table: Arc<DescriptorTable>,
    runner_config: RunnerConfig,
    results: Arc<ResultLog>,
    stop: Arc<AtomicBool>,
}

impl WindowOrchestrator {
    pub fn new(
        site_url: impl Into<Arc<str>>,
        task_types: impl Into<Arc<[TaskType]>>,
        table: Arc<DescriptorTable>,
        runner_config: RunnerConfig,
        results: Arc<ResultLog>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            site_url: site_url.into(),
            task_types: task_types.into(),
            table,
            runner_config,
            results,
            stop,
        }
    }

    pub async fn run(&self, session: &Session, login: &dyn LoginFlow) -> TaskHiveResult<()> {
        if !login.login(session, &self.site_url).await {
            return Err(TaskHiveError::Login(format!(
                "session {} could not log into the task site",
                session.id()
            )));
        }

        for &task_type in self.task_types.iter() {
            if self.stop.load(Ordering::Relaxed) {
                tracing::info!(session = %session.id(), "stop requested, leaving remaining tasks");
                break;
            }

            let Some(descriptor) = self.table.lookup(task_type) else {
                tracing::warn!(session = %session.id(), task = %task_type, "no descriptor configured, skipping");
                continue;
            };

            // A trigger that is not clickable means this account already did
            // the task (or the site withdrew it); skip without an attempt.
            if session
                .driver()
                .wait_clickable(&descriptor.action, self.runner_config.probe_wait())
                .await
                .is_err()
            {
                tracing::info!(session = %session.id(), task = %task_type, "already completed, skipping");
                continue;
            }

            let runner = TaskRunner::new(session.driver(), &self.runner_config, Arc::clone(&self.stop));
            let verdict = runner.run(task_type, descriptor).await;
            let outcome = match verdict {
                Verdict::Completed => TaskOutcome::success(session.id(), task_type),
                Verdict::Failed(reason) => TaskOutcome::failure(session.id(), task_type, reason),
            };
            self.results.append(outcome).await;
        }

        Ok(())
    }
}
