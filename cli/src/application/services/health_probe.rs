//! Application service — bounded HTTP health polling.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::{HttpProbe, ProcessControl, ProgressReporter};
use crate::domain::service::is_healthy_status;
use crate::domain::{ProbePolicy, RuntimeConfig, ServiceError, ServiceHandle};

/// Poll the web UI until it answers, the process dies, or attempts run out.
///
/// Liveness is checked before every request so a crash surfaces as
/// [`ServiceError::Crashed`] immediately instead of after the full budget.
/// Returns the number of attempts used.
///
/// # Errors
///
/// Returns [`ServiceError::Crashed`] or [`ServiceError::HealthTimeout`], or an
/// error if the liveness check itself fails.
pub async fn wait_until_healthy(
    processes: &impl ProcessControl,
    http: &impl HttpProbe,
    reporter: &impl ProgressReporter,
    config: &RuntimeConfig,
    handle: ServiceHandle,
    policy: ProbePolicy,
) -> Result<u32> {
    let url = config.gui_url();
    reporter.step(&format!("waiting for {url}..."));

    for attempt in 1..=policy.attempts {
        if !processes.is_alive(handle.pid).await? {
            return Err(ServiceError::Crashed {
                pid: handle.pid,
                log: config.log_file.clone(),
            }
            .into());
        }

        match http.get_status(&url, policy.request_timeout).await {
            Ok(status) if is_healthy_status(status) => {
                reporter.success(&format!("Agent Zero is answering on {url}"));
                return Ok(attempt);
            }
            Ok(status) => tracing::debug!(attempt, status, "health check not ready"),
            Err(e) => tracing::debug!(attempt, error = %e, "health check not ready"),
        }

        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(ServiceError::HealthTimeout {
        url,
        attempts: policy.attempts,
        log: config.log_file.clone(),
    }
    .into())
}
