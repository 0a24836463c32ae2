use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::driver::session::{Session, SessionInfo};
use crate::errors::TaskHiveResult;

/// Declarative description of how to find a UI element on the task page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(pub String);

impl Locator {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn selector(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    /// The element is not on the page (and did not appear within the wait).
    #[error("no element matching `{0}`")]
    NotFound(String),

    /// The element exists but the awaited condition did not hold in time.
    #[error("timed out after {timeout:?} waiting on `{locator}`")]
    Timeout { locator: String, timeout: Duration },

    #[error("driver backend error: {0}")]
    Backend(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Element-level operations one owned browser session exposes to the task
/// runner. Implementations poll under a deadline; none of these block past
/// their timeout.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Navigates the session's working tab to `url`.
    async fn open(&self, url: &str) -> DriverResult<()>;

    /// Waits for an element matching `locator` to be present.
    /// `NotFound` if it never appears within `timeout`.
    async fn find(&self, locator: &Locator, timeout: Duration) -> DriverResult<()>;

    /// Waits for the element to be present, visible and enabled.
    async fn wait_clickable(&self, locator: &Locator, timeout: Duration) -> DriverResult<()>;

    /// Clicks the first element matching `locator`.
    async fn click(&self, locator: &Locator) -> DriverResult<()>;

    /// Waits for the element to become invisible. An element that is absent
    /// altogether counts as invisible. `Timeout` if it stays visible.
    async fn wait_invisible(&self, locator: &Locator, timeout: Duration) -> DriverResult<()>;

    /// Releases the underlying browser connection.
    async fn close(&self) -> DriverResult<()>;
}

/// Discovery + connection for independently-owned browser windows.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn list_active_sessions(&self) -> TaskHiveResult<Vec<SessionInfo>>;

    async fn connect(&self, info: &SessionInfo) -> TaskHiveResult<Session>;
}

/// Boolean login gate run once per session before any task.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    async fn login(&self, session: &Session, site_url: &str) -> bool;
}
