//! Network infrastructure — implements `PortProbe` and `HttpProbe`.

use std::io::ErrorKind;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{HttpProbe, PortProbe};

/// Checks port availability by trying to bind it.
pub struct TcpPortProbe;

impl PortProbe for TcpPortProbe {
    async fn is_port_free(&self, host: &str, port: u16) -> Result<bool> {
        match tokio::net::TcpListener::bind((host, port)).await {
            Ok(listener) => {
                drop(listener);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => Ok(false),
            Err(e) => Err(e).with_context(|| format!("cannot bind {host}:{port}")),
        }
    }
}

/// HTTP health probe backed by `reqwest`.
pub struct ReqwestHttpProbe {
    client: reqwest::Client,
}

impl ReqwestHttpProbe {
    /// Build the probe's HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("agent-zero-install/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl HttpProbe for ReqwestHttpProbe {
    async fn get_status(&self, url: &str, timeout: Duration) -> Result<u16> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        Ok(response.status().as_u16())
    }
}
