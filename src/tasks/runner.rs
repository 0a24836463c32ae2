use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::RunnerConfig;
use crate::driver::traits::{DriverError, SessionDriver};
use crate::tasks::types::{FailReason, TaskDescriptor, TaskType};

/// Lifecycle states of one task-completion run. The attempt counter counts
/// verify clicks issued; a countdown restart re-enters the wait without
/// consuming one.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TaskState {
    Idle,
    Triggered,
    CountdownWait { attempts_used: u32 },
    VerifyAttempt { attempts_used: u32 },
    Completed,
    Failed(FailReason),
}

/// Terminal verdict of a task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Completed,
    Failed(FailReason),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Completed)
    }

    pub fn fail_reason(&self) -> Option<&FailReason> {
        match self {
            Verdict::Completed => None,
            Verdict::Failed(reason) => Some(reason),
        }
    }
}

/// Drives one task type on one session through trigger → countdown →
/// verify-retry until a terminal state. The page only signals completion
/// indirectly (the trigger button disappearing), and its countdown can
/// restart mid-run, so a restarted countdown is a normal transition here, not
/// an error; total verify clicks stay bounded by `max_attempts`.
pub struct TaskRunner<'a> {
    driver: &'a dyn SessionDriver,
    config: &'a RunnerConfig,
    stop: Arc<AtomicBool>,
}

impl<'a> TaskRunner<'a> {
    pub fn new(driver: &'a dyn SessionDriver, config: &'a RunnerConfig, stop: Arc<AtomicBool>) -> Self {
        Self {
            driver,
            config,
            stop,
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Sleeps out the site's mandatory cooldown. The remote countdown timer
    /// is not reliably observable, so this is a plain sleep, chunked only to
    /// notice a stop request. Returns false when stopped early.
    async fn countdown(&self) -> bool {
        let total = self.config.countdown();
        let start = tokio::time::Instant::now();
        while start.elapsed() < total {
            if self.stopped() {
                return false;
            }
            let remaining = total - start.elapsed();
            tokio::time::sleep(remaining.min(Duration::from_millis(500))).await;
        }
        !self.stopped()
    }

    pub async fn run(&self, task_type: TaskType, descriptor: &TaskDescriptor) -> Verdict {
        let mut state = TaskState::Idle;
        loop {
            match state {
                TaskState::Idle => {
                    state = match self
                        .driver
                        .wait_clickable(&descriptor.action, self.config.element_wait())
                        .await
                    {
                        Ok(()) => match self.driver.click(&descriptor.action).await {
                            Ok(()) => {
                                tracing::info!(task = %task_type, "task triggered");
                                TaskState::Triggered
                            }
                            Err(e) => {
                                tracing::warn!(task = %task_type, error = %e, "trigger click failed");
                                TaskState::Failed(FailReason::TriggerUnavailable)
                            }
                        },
                        // Presumed already completed or unavailable; not retryable.
                        Err(e) => {
                            tracing::info!(task = %task_type, error = %e, "trigger not clickable");
                            TaskState::Failed(FailReason::TriggerUnavailable)
                        }
                    };
                }

                TaskState::Triggered => {
                    state = TaskState::CountdownWait { attempts_used: 0 };
                }

                TaskState::CountdownWait { attempts_used } => {
                    tracing::debug!(
                        task = %task_type,
                        secs = self.config.countdown_secs,
                        attempts_used,
                        "waiting out countdown"
                    );
                    state = if self.countdown().await {
                        TaskState::VerifyAttempt { attempts_used }
                    } else {
                        TaskState::Failed(FailReason::Cancelled)
                    };
                }

                TaskState::VerifyAttempt { attempts_used } => {
                    if self.stopped() {
                        state = TaskState::Failed(FailReason::Cancelled);
                        continue;
                    }
                    if attempts_used >= self.config.max_attempts {
                        state = TaskState::Failed(FailReason::RetryExhausted {
                            attempts: attempts_used,
                        });
                        continue;
                    }
                    state = self.verify_once(task_type, descriptor, attempts_used).await;
                }

                TaskState::Completed => return Verdict::Completed,

                TaskState::Failed(reason) => {
                    tracing::warn!(task = %task_type, reason = ?reason, "task failed");
                    return Verdict::Failed(reason);
                }
            }
        }
    }

    /// One verify round: click the verify button, then re-check the trigger
    /// button for the completion signal.
    async fn verify_once(
        &self,
        task_type: TaskType,
        descriptor: &TaskDescriptor,
        attempts_used: u32,
    ) -> TaskState {
        // No verify affordance means this attempt sequence cannot succeed.
        if let Err(e) = self
            .driver
            .find(&descriptor.verify, self.config.element_wait())
            .await
        {
            tracing::warn!(task = %task_type, error = %e, "verify button missing");
            return TaskState::Failed(FailReason::VerifyMissing);
        }
        if let Err(e) = self.driver.click(&descriptor.verify).await {
            tracing::warn!(task = %task_type, error = %e, "verify click failed");
            return TaskState::Failed(FailReason::VerifyMissing);
        }
        let attempts_used = attempts_used + 1;
        tracing::debug!(task = %task_type, attempt = attempts_used, "verify clicked");

        // The trigger button disappearing is the completion signal. Its
        // absence altogether also means done.
        match self
            .driver
            .find(&descriptor.action, self.config.probe_wait())
            .await
        {
            Err(_) => {
                tracing::info!(task = %task_type, "trigger gone, task complete");
                TaskState::Completed
            }
            Ok(()) => match self
                .driver
                .wait_invisible(&descriptor.action, self.config.element_wait())
                .await
            {
                Ok(()) => {
                    tracing::info!(task = %task_type, attempt = attempts_used, "task verified");
                    TaskState::Completed
                }
                Err(DriverError::Timeout { .. }) => {
                    // Still visible: the site restarted its countdown. With
                    // no verify clicks left there is nothing another cooldown
                    // could buy, so fail now instead of sleeping one out.
                    if attempts_used >= self.config.max_attempts {
                        return TaskState::Failed(FailReason::RetryExhausted {
                            attempts: attempts_used,
                        });
                    }
                    tracing::info!(task = %task_type, attempt = attempts_used, "countdown restarted");
                    TaskState::CountdownWait { attempts_used }
                }
                Err(e) => {
                    tracing::warn!(task = %task_type, error = %e, "invisibility wait errored");
                    if attempts_used >= self.config.max_attempts {
                        return TaskState::Failed(FailReason::RetryExhausted {
                            attempts: attempts_used,
                        });
                    }
                    TaskState::CountdownWait { attempts_used }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeDriver, Step};
    use crate::driver::traits::Locator;

    const ACTION: &str = "button.start";
    const VERIFY: &str = "button.verify";

    fn descriptor() -> TaskDescriptor {
        TaskDescriptor {
            action: Locator::new(ACTION),
            verify: Locator::new(VERIFY),
        }
    }

    fn config() -> RunnerConfig {
        RunnerConfig {
            max_attempts: 5,
            countdown_secs: 30,
            element_wait_secs: 20,
            probe_wait_secs: 5,
            poll_interval_ms: 200,
        }
    }

    fn runner<'a>(driver: &'a FakeDriver, config: &'a RunnerConfig) -> TaskRunner<'a> {
        TaskRunner::new(driver, config, Arc::new(AtomicBool::new(false)))
    }

    #[tokio::test(start_paused = true)]
    async fn completes_on_first_verify() {
        let driver = FakeDriver::new();
        // Trigger still present at re-check, then goes invisible.
        driver.script_find(ACTION, &[], Step::Ok);
        driver.script_invisible(ACTION, &[], Step::Ok);
        let cfg = config();

        let verdict = runner(&driver, &cfg).run(TaskType::Like, &descriptor()).await;

        assert!(verdict.is_success());
        assert_eq!(driver.clicks_on(ACTION), 1);
        assert_eq!(driver.clicks_on(VERIFY), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_gone_at_recheck_counts_as_completed() {
        let driver = FakeDriver::new();
        driver.script_find(ACTION, &[], Step::NotFound);
        let cfg = config();

        let verdict = runner(&driver, &cfg).run(TaskType::Watch, &descriptor()).await;

        assert!(verdict.is_success());
        assert_eq!(driver.clicks_on(VERIFY), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_verify_button_fails_without_retry() {
        let driver = FakeDriver::new();
        driver.script_find(VERIFY, &[], Step::NotFound);
        let cfg = config();

        let verdict = runner(&driver, &cfg).run(TaskType::Share, &descriptor()).await;

        assert_eq!(verdict.fail_reason(), Some(&FailReason::VerifyMissing));
        assert_eq!(driver.clicks_on(VERIFY), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_restart_retries_and_then_completes() {
        let driver = FakeDriver::new();
        driver.script_find(ACTION, &[], Step::Ok);
        // First verify click leaves the trigger visible (countdown restarted),
        // the second one lands.
        driver.script_invisible(ACTION, &[Step::Timeout, Step::Ok], Step::Ok);
        let cfg = config();

        let verdict = runner(&driver, &cfg).run(TaskType::Quote, &descriptor()).await;

        assert!(verdict.is_success());
        assert_eq!(driver.clicks_on(VERIFY), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_fail_with_bounded_clicks() {
        let driver = FakeDriver::new();
        driver.script_find(ACTION, &[], Step::Ok);
        driver.script_invisible(ACTION, &[], Step::Timeout);
        let cfg = config();

        let verdict = runner(&driver, &cfg).run(TaskType::Reply, &descriptor()).await;

        assert_eq!(
            verdict.fail_reason(),
            Some(&FailReason::RetryExhausted { attempts: 5 })
        );
        assert_eq!(driver.clicks_on(VERIFY), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_skips_the_trailing_countdown() {
        let driver = FakeDriver::new();
        driver.script_find(ACTION, &[], Step::Ok);
        driver.script_invisible(ACTION, &[], Step::Timeout);
        let mut cfg = config();
        cfg.max_attempts = 2;

        let start = tokio::time::Instant::now();
        let verdict = runner(&driver, &cfg).run(TaskType::Watch, &descriptor()).await;

        assert_eq!(
            verdict.fail_reason(),
            Some(&FailReason::RetryExhausted { attempts: 2 })
        );
        // One countdown per verify click; no extra cooldown after the last
        // click has already failed.
        assert!(start.elapsed() >= cfg.countdown() * 2);
        assert!(start.elapsed() < cfg.countdown() * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unclickable_trigger_fails_immediately() {
        let driver = FakeDriver::new();
        driver.script_clickable(ACTION, &[], Step::Timeout);
        let cfg = config();

        let verdict = runner(&driver, &cfg).run(TaskType::Like, &descriptor()).await;

        assert_eq!(verdict.fail_reason(), Some(&FailReason::TriggerUnavailable));
        assert_eq!(driver.clicks_on(ACTION), 0);
        assert_eq!(driver.clicks_on(VERIFY), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_flag_cancels_during_countdown() {
        let driver = FakeDriver::new();
        let cfg = config();
        let stop = Arc::new(AtomicBool::new(false));
        stop.store(true, Ordering::Relaxed);
        let runner = TaskRunner::new(&driver, &cfg, stop);

        let verdict = runner.run(TaskType::Like, &descriptor()).await;

        assert_eq!(verdict.fail_reason(), Some(&FailReason::Cancelled));
        assert_eq!(driver.clicks_on(VERIFY), 0);
    }
}
