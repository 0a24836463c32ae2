use serde::Deserialize;

use crate::config::AccountConfig;
use crate::driver::traits::SessionDriver;
use crate::errors::{TaskHiveError, TaskHiveResult};

/// One row of the ADS active-window listing, as reported by the local API.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    pub user_id: String,
    #[serde(default)]
    pub debug_port: Option<String>,
    #[serde(default)]
    pub ws: WsEndpoints,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsEndpoints {
    /// CDP websocket endpoint, when the launcher exposes one directly.
    #[serde(default)]
    pub puppeteer: Option<String>,
    /// `host:port` debugger address; the CDP endpoint is discovered from it.
    #[serde(default)]
    pub selenium: Option<String>,
}

/// One exclusively-owned browser connection bound to an account
/// configuration. The account binding is fixed at connect time; `close`
/// consumes the session so it can only happen once.
pub struct Session {
    id: String,
    account: AccountConfig,
    driver: Box<dyn SessionDriver>,
}

impl Session {
    pub fn new(id: impl Into<String>, account: AccountConfig, driver: Box<dyn SessionDriver>) -> Self {
        Self {
            id: id.into(),
            account,
            driver,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    pub fn driver(&self) -> &dyn SessionDriver {
        self.driver.as_ref()
    }

    pub async fn close(self) -> TaskHiveResult<()> {
        self.driver
            .close()
            .await
            .map_err(|e| TaskHiveError::Driver(e.to_string()))?;
        tracing::debug!(session = %self.id, "session closed");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}
