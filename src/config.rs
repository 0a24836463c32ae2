use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{TaskHiveError, TaskHiveResult};
use crate::tasks::types::TaskType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Task platform entry URL opened after connecting each session.
    pub task_site_url: String,
    /// Task types to run, in execution order, per session.
    pub task_types: Vec<TaskType>,
    /// Per-task-type locator pairs. A type listed in `task_types` but absent
    /// here is logged and skipped at run time.
    pub tasks: HashMap<TaskType, LocatorEntry>,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub ads: AdsConfig,
}

/// {action, verify} selector pair for one task type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorEntry {
    /// Selector of the button that starts the task.
    pub action: String,
    /// Selector of the button that confirms completion.
    pub verify: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Worker cap; the effective pool size is min(cap, connected sessions).
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Verify clicks issued before a task is declared failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Mandatory cooldown before verification is accepted by the site.
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,
    /// Deadline for each bounded element wait (find/clickable/invisible).
    #[serde(default = "default_element_wait_secs")]
    pub element_wait_secs: u64,
    /// Probe deadline for the "already completed?" clickability check.
    #[serde(default = "default_probe_wait_secs")]
    pub probe_wait_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl RunnerConfig {
    pub fn countdown(&self) -> Duration {
        Duration::from_secs(self.countdown_secs)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn probe_wait(&self) -> Duration {
        Duration::from_secs(self.probe_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            countdown_secs: default_countdown_secs(),
            element_wait_secs: default_element_wait_secs(),
            probe_wait_secs: default_probe_wait_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdsConfig {
    /// Local ADS fingerprint-browser API listing active windows.
    #[serde(default = "default_ads_api_url")]
    pub api_url: String,
    /// Account configuration per browser profile id (`user_id` in the ADS
    /// listing). Windows without an entry here are skipped.
    #[serde(default)]
    pub accounts: HashMap<String, AccountConfig>,
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            api_url: default_ads_api_url(),
            accounts: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountConfig {
    #[serde(default)]
    pub task_site: Option<Credentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

fn default_max_workers() -> usize {
    15
}

fn default_max_attempts() -> u32 {
    5
}

fn default_countdown_secs() -> u64 {
    30
}

fn default_element_wait_secs() -> u64 {
    20
}

fn default_probe_wait_secs() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_ads_api_url() -> String {
    "http://127.0.0.1:50325/api/v1/browser/local-active".into()
}

fn resolve_config_path() -> TaskHiveResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(TaskHiveError::Config(
        "config.toml not found next to executable or in working directory".into(),
    ))
}

pub fn load_config() -> TaskHiveResult<AppConfig> {
    let path = resolve_config_path()?;
    let content = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(
        path = %path.display(),
        site = %config.task_site_url,
        task_types = config.task_types.len(),
        "config loaded"
    );
    Ok(config)
}
