use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{AccountConfig, AdsConfig};
use crate::driver::cdp::CdpDriver;
use crate::driver::session::{Session, SessionInfo};
use crate::driver::traits::SessionProvider;
use crate::errors::{TaskHiveError, TaskHiveResult};

/// Client for the ADS fingerprint-browser local API. Lists the browser
/// windows the user already has open and attaches a [`CdpDriver`] to each one
/// that has an account configuration.
pub struct AdsClient {
    http: reqwest::Client,
    api_url: String,
    accounts: HashMap<String, AccountConfig>,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct AdsResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<AdsData>,
}

#[derive(Debug, Default, Deserialize)]
struct AdsData {
    #[serde(default)]
    list: Vec<SessionInfo>,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

impl AdsClient {
    pub fn new(config: &AdsConfig, poll_interval: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            accounts: config.accounts.clone(),
            poll_interval,
        }
    }

    /// Resolves a CDP websocket endpoint for one listed window. The launcher
    /// usually hands one out directly; otherwise it is discovered from the
    /// debugger address via `/json/version`.
    async fn resolve_ws_url(&self, info: &SessionInfo) -> TaskHiveResult<String> {
        if let Some(ws) = &info.ws.puppeteer {
            return Ok(ws.clone());
        }
        let address = info.ws.selenium.as_deref().ok_or_else(|| {
            TaskHiveError::Connect(format!("no debugger endpoint for window {}", info.user_id))
        })?;
        let version: VersionInfo = self
            .http
            .get(format!("http://{address}/json/version"))
            .send()
            .await?
            .json()
            .await?;
        Ok(version.web_socket_debugger_url)
    }
}

#[async_trait]
impl SessionProvider for AdsClient {
    async fn list_active_sessions(&self) -> TaskHiveResult<Vec<SessionInfo>> {
        let response: AdsResponse = self.http.get(&self.api_url).send().await?.json().await?;
        if response.code != 0 {
            return Err(TaskHiveError::Connect(format!(
                "ADS API error: {}",
                response.msg.unwrap_or_else(|| "unknown".into())
            )));
        }
        let list = response.data.unwrap_or_default().list;
        tracing::info!(windows = list.len(), "active browser windows listed");
        Ok(list)
    }

    async fn connect(&self, info: &SessionInfo) -> TaskHiveResult<Session> {
        let account = self.accounts.get(&info.user_id).ok_or_else(|| {
            TaskHiveError::Connect(format!(
                "no account configuration for window {}",
                info.user_id
            ))
        })?;

        let ws_url = self.resolve_ws_url(info).await?;
        let driver = CdpDriver::connect(&ws_url, self.poll_interval).await?;
        tracing::info!(
            session = %info.user_id,
            debug_port = info.debug_port.as_deref().unwrap_or("-"),
            "connected to browser window"
        );
        Ok(Session::new(
            info.user_id.clone(),
            account.clone(),
            Box::new(driver),
        ))
    }
}
