use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use futures_util::StreamExt;

use crate::driver::traits::{DriverError, DriverResult, Locator, SessionDriver};
use crate::errors::{TaskHiveError, TaskHiveResult};

/// [`SessionDriver`] over an already-running Chromium instance, attached via
/// its CDP websocket endpoint. Element waits are JS predicates polled under a
/// deadline; visibility follows the `offsetParent` convention.
pub struct CdpDriver {
    /// Held for the lifetime of the driver; dropping it tears down the
    /// websocket connection.
    _browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    poll_interval: Duration,
}

impl CdpDriver {
    /// Attaches to the browser behind `ws_url` and opens a fresh working tab,
    /// leaving whatever tabs the profile already has alone.
    pub async fn connect(ws_url: &str, poll_interval: Duration) -> TaskHiveResult<Self> {
        let (browser, mut handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| TaskHiveError::Connect(format!("{ws_url}: {e}")))?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| TaskHiveError::Connect(format!("new tab: {e}")))?;

        Ok(Self {
            _browser: browser,
            page,
            handler_task,
            poll_interval,
        })
    }

    /// Polls a boolean JS predicate until it holds or `timeout` elapses.
    /// Returns whether the predicate held.
    async fn poll_predicate(&self, js: &str, timeout: Duration) -> DriverResult<bool> {
        let start = std::time::Instant::now();
        loop {
            let holds = self
                .page
                .evaluate(js)
                .await
                .map_err(|e| DriverError::Backend(e.to_string()))?
                .into_value::<bool>()
                .unwrap_or(false);
            if holds {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn js_selector(locator: &Locator) -> String {
    // JSON-quote the selector so it lands in the JS source as a string literal.
    serde_json::to_string(locator.selector()).unwrap_or_else(|_| "\"\"".into())
}

fn presence_js(locator: &Locator) -> String {
    format!("document.querySelector({}) !== null", js_selector(locator))
}

fn clickable_js(locator: &Locator) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); \
         return !!el && !el.disabled && el.offsetParent !== null; }})()",
        js_selector(locator)
    )
}

fn invisible_js(locator: &Locator) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); \
         return el === null || el.offsetParent === null; }})()",
        js_selector(locator)
    )
}

#[async_trait]
impl SessionDriver for CdpDriver {
    async fn open(&self, url: &str) -> DriverResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Backend(format!("goto {url}: {e}")))?;
        Ok(())
    }

    async fn find(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        if self.poll_predicate(&presence_js(locator), timeout).await? {
            Ok(())
        } else {
            Err(DriverError::NotFound(locator.selector().into()))
        }
    }

    async fn wait_clickable(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        if self.poll_predicate(&clickable_js(locator), timeout).await? {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                locator: locator.selector().into(),
                timeout,
            })
        }
    }

    async fn click(&self, locator: &Locator) -> DriverResult<()> {
        let element = self
            .page
            .find_element(locator.selector())
            .await
            .map_err(|_| DriverError::NotFound(locator.selector().into()))?;
        element
            .click()
            .await
            .map_err(|e| DriverError::Backend(format!("click `{locator}`: {e}")))?;
        Ok(())
    }

    async fn wait_invisible(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        if self.poll_predicate(&invisible_js(locator), timeout).await? {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                locator: locator.selector().into(),
                timeout,
            })
        }
    }

    async fn close(&self) -> DriverResult<()> {
        // Detach only: the fingerprint browser window is not ours to kill.
        // Best-effort close of the working tab we opened, then drop the
        // connection's event pump.
        let _ = self.page.evaluate("window.close()").await;
        self.handler_task.abort();
        Ok(())
    }
}
