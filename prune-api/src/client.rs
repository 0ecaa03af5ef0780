use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, info};

/// Jenkins URL plus the user and API token used for basic auth.
#[derive(Clone)]
pub struct Credentials {
    pub url: String,
    pub user: String,
    pub token: String,
}

impl Credentials {
    /// All three parts are required; anything missing or blank yields `None`.
    pub fn from_parts(
        url: Option<String>,
        user: Option<String>,
        token: Option<String>,
    ) -> Option<Self> {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Some(Self {
            url: present(url)?,
            user: present(user)?,
            token: present(token)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiOptions {
    pub timeout: Duration,
    /// `depth` query parameter; 2 includes each plugin's dependency list.
    pub depth: u32,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            depth: 2,
        }
    }
}

/// Blocking client for the plugin manager endpoint.
pub struct JenkinsClient {
    client: Client,
    credentials: Credentials,
    options: ApiOptions,
}

impl JenkinsClient {
    pub fn new(credentials: Credentials, options: ApiOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            credentials,
            options,
        })
    }

    pub fn plugins_url(&self) -> String {
        format!(
            "{}/pluginManager/api/json?depth={}",
            self.credentials.url.trim_end_matches('/'),
            self.options.depth
        )
    }

    /// Fetch the raw plugin manager JSON body.
    pub fn fetch_plugin_manager(&self) -> Result<String> {
        let url = self.plugins_url();
        debug!(url = %url, user = %self.credentials.user, "Fetching plugin metadata");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.token))
            .send()
            .with_context(|| format!("Failed to reach {url}"))?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!(
                "Plugin manager request to {} failed with {}: {}",
                url,
                status,
                error_text.trim()
            );
        }

        let body = response
            .text()
            .with_context(|| format!("Failed to read response body from {url}"))?;
        info!(url = %url, bytes = body.len(), "Fetched plugin metadata");
        Ok(body)
    }
}
