pub mod config;
pub mod driver;
pub mod errors;
pub mod orchestrator;
pub mod tasks;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::driver::ads::AdsClient;
use crate::driver::login::SiteLogin;
use crate::driver::traits::SessionProvider;
use crate::errors::{TaskHiveError, TaskHiveResult};
use crate::orchestrator::pool::PoolCoordinator;
use crate::orchestrator::results::{ResultLog, RunSummary};

/// Full pipeline: list the user's open browser windows, attach to every one
/// with an account configuration, fan the task run out across them, and
/// return the aggregated summary. Errors only when not a single window could
/// be connected; individual connect failures are logged and skipped.
pub async fn run(config: AppConfig) -> TaskHiveResult<RunSummary> {
    let provider = AdsClient::new(&config.ads, config.runner.poll_interval());

    let windows = provider.list_active_sessions().await?;
    let mut sessions = Vec::new();
    for info in &windows {
        match provider.connect(info).await {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::error!(window = %info.user_id, error = %e, "skipping browser window");
            }
        }
    }
    if sessions.is_empty() {
        return Err(TaskHiveError::Connect(
            "no browser windows could be connected".into(),
        ));
    }

    let coordinator = PoolCoordinator::new(&config);

    // Ctrl-C asks in-flight waits to wind down at their next deadline check.
    let stop = coordinator.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("stop requested, letting in-flight waits drain");
            stop.store(true, Ordering::Relaxed);
        }
    });

    let results = Arc::new(ResultLog::persistent());
    let summary = coordinator
        .run_all(sessions, Arc::new(SiteLogin), Arc::clone(&results))
        .await;
    tracing::info!(summary = %summary, "task run finished");
    Ok(summary)
}
