use std::io::Write;
use std::path::PathBuf;

use tokio::sync::Mutex;

use crate::errors::TaskHiveResult;
use crate::tasks::types::TaskOutcome;

/// Append-only outcome log shared by all workers. The mutex around the entry
/// vector is the single cross-worker contention point in the whole run.
/// A persistent log also mirrors every append to a JSONL file, one outcome
/// per line.
pub struct ResultLog {
    run_id: String,
    entries: Mutex<Vec<TaskOutcome>>,
    file_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub successes: usize,
    pub total: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} tasks completed successfully", self.successes, self.total)
    }
}

impl ResultLog {
    /// In-memory log; nothing written to disk.
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            entries: Mutex::new(Vec::new()),
            file_path: None,
        }
    }

    /// Log mirrored to `run_<id>.jsonl` under the data directory.
    pub fn persistent() -> Self {
        let run_id = uuid::Uuid::new_v4().to_string();
        let file_path = data_dir_or_cwd().join(format!("run_{run_id}.jsonl"));
        Self {
            run_id,
            entries: Mutex::new(Vec::new()),
            file_path: Some(file_path),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub async fn append(&self, outcome: TaskOutcome) {
        let mut entries = self.entries.lock().await;
        if let Err(e) = self.flush_line(&outcome) {
            tracing::warn!(error = %e, "failed to write outcome to run log");
        }
        tracing::info!(
            session = %outcome.session_id,
            task = %outcome.task_type,
            success = outcome.success,
            "outcome recorded"
        );
        entries.push(outcome);
    }

    fn flush_line(&self, outcome: &TaskOutcome) -> TaskHiveResult<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let line = serde_json::to_string(outcome)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<TaskOutcome> {
        self.entries.lock().await.clone()
    }

    pub async fn summary(&self) -> RunSummary {
        let entries = self.entries.lock().await;
        RunSummary {
            successes: entries.iter().filter(|o| o.success).count(),
            total: entries.len(),
        }
    }
}

impl Default for ResultLog {
    fn default() -> Self {
        Self::new()
    }
}

/// `~/.local/share/taskhive/runs` on Linux/macOS, `%LOCALAPPDATA%\TaskHive\runs`
/// on Windows, falling back to the current working directory.
fn data_dir_or_cwd() -> PathBuf {
    #[cfg(target_os = "windows")]
    let base = std::env::var("LOCALAPPDATA").ok().map(PathBuf::from);

    #[cfg(not(target_os = "windows"))]
    let base = std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".local").join("share"));

    if let Some(data_dir) = base {
        #[cfg(target_os = "windows")]
        let d = data_dir.join("TaskHive").join("runs");
        #[cfg(not(target_os = "windows"))]
        let d = data_dir.join("taskhive").join("runs");
        let _ = std::fs::create_dir_all(&d);
        return d;
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
