//! # Bootstrap
//!
//! Makes sure the scripts the bridge depends on are present on the page and
//! that the registration script has initialized before anything is wired
//! together. Scripts already on the page are never loaded twice.

use crate::component::ScriptLoader;
use crate::error::{BridgeError, BridgeResult};
use crate::logging;
use crate::polling::ReadinessGate;
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct Bootstrap {
    loader: Arc<dyn ScriptLoader>,
    gate: ReadinessGate,
}

impl Bootstrap {
    pub fn new(loader: Arc<dyn ScriptLoader>, gate: ReadinessGate) -> Self {
        Self { loader, gate }
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Load every URL in `urls` not yet present on the page.
    ///
    /// Missing scripts load concurrently; the first failure aborts. Returns the
    /// URLs that were loaded, in request order.
    pub async fn ensure_scripts(&self, urls: &[&str]) -> BridgeResult<Vec<String>> {
        let present: HashSet<String> = self.loader.loaded_scripts().into_iter().collect();
        let mut seen = HashSet::new();
        let missing: Vec<String> = urls
            .iter()
            .filter(|url| !present.contains(**url) && seen.insert(**url))
            .map(|url| url.to_string())
            .collect();

        if missing.is_empty() {
            debug!(requested = urls.len(), "All bridge scripts already present");
            return Ok(missing);
        }

        try_join_all(missing.iter().map(|url| async move {
            self.loader
                .load(url)
                .await
                .map_err(|e| BridgeError::ScriptLoadFailed {
                    url: url.clone(),
                    reason: e.to_string(),
                })
        }))
        .await?;

        info!(loaded = ?missing, "📜 Bridge scripts loaded");
        Ok(missing)
    }

    /// Ensure `urls` are loaded, wait for `condition`, then run `continuation` once.
    ///
    /// Any failure is logged and returned; `continuation` then never runs.
    pub async fn ensure_scripts_then<C, F>(
        &self,
        urls: &[&str],
        dependency: &str,
        condition: C,
        continuation: F,
    ) -> BridgeResult<()>
    where
        C: FnMut() -> bool + Send,
        F: FnOnce() + Send,
    {
        let result = async move {
            self.ensure_scripts(urls).await?;
            self.gate
                .wait_until_ready(dependency, condition, &CancellationToken::new())
                .await
        }
        .await;

        match result {
            Ok(_) => {
                continuation();
                Ok(())
            }
            Err(error) => {
                logging::log_error(
                    "bootstrap",
                    "ensure_scripts_then",
                    &error.to_string(),
                    Some(dependency),
                );
                Err(error)
            }
        }
    }
}
