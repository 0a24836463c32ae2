use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::driver::session::Session;
use crate::driver::traits::LoginFlow;

/// Default login flow: open the task site in the session's tab and give the
/// page a jittered settle delay. The fingerprint browser profiles stay logged
/// in, so no credential entry happens here; a flow that types credentials can
/// replace this behind [`LoginFlow`].
pub struct SiteLogin;

#[async_trait]
impl LoginFlow for SiteLogin {
    async fn login(&self, session: &Session, site_url: &str) -> bool {
        tracing::info!(session = %session.id(), url = %site_url, "logging into task site");
        if let Err(e) = session.driver().open(site_url).await {
            tracing::error!(session = %session.id(), error = %e, "task site failed to open");
            return false;
        }

        // Jittered settle delay so N sessions do not hit the site in lockstep.
        let settle_ms = rand::thread_rng().gen_range(2_000..4_000);
        tokio::time::sleep(Duration::from_millis(settle_ms)).await;
        true
    }
}
