use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com/";
pub const DEFAULT_FABRIC_API_VERSION: &str = "2023-06-15";
pub const DEFAULT_RESOURCES_API_VERSION: &str = "2021-04-01";
/// Matches the polling frequency the Azure SDKs fall back to when ARM sends no
/// `Retry-After` header.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Settings for talking to Azure Resource Manager.
///
/// Environment variables (all optional):
/// - `AZURE_RESOURCE_MANAGER_ENDPOINT`: ARM base URL, e.g. a sovereign cloud endpoint.
/// - `MANAGED_FABRIC_API_VERSION`: `api-version` for `Microsoft.ManagedNetworkFabric`.
/// - `AZURE_RESOURCES_API_VERSION`: `api-version` for resource groups.
/// - `AZURE_POLL_INTERVAL_SECS`: delay between LRO polls when ARM gives no hint.
/// - `AZURE_HTTP_TIMEOUT_SECS`: per-request timeout.
#[derive(Debug, Clone)]
pub struct ArmConfig {
    pub endpoint: Url,
    pub fabric_api_version: String,
    pub resources_api_version: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
}

impl ArmConfig {
    /// OAuth scope for tokens accepted by this endpoint.
    pub fn scope(&self) -> String {
        format!("{}/.default", self.endpoint.as_str().trim_end_matches('/'))
    }
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ARM_ENDPOINT).expect("default endpoint is a valid URL"),
            fabric_api_version: DEFAULT_FABRIC_API_VERSION.into(),
            resources_api_version: DEFAULT_RESOURCES_API_VERSION.into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Top-level server configuration assembled from environment variables at startup.
///
/// `AZURE_ACCESS_TOKEN`, when set, is used as the ARM bearer token instead of
/// asking the Azure CLI.  Useful for hosts without `az` installed.
#[derive(Clone, Default)]
pub struct Config {
    pub arm: ArmConfig,
    pub access_token: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("arm", &self.arm)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Build configuration from the current process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.  Unset keys take
    /// their defaults; set-but-invalid keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = match lookup("AZURE_RESOURCE_MANAGER_ENDPOINT") {
            Some(raw) => {
                let url = Url::parse(&raw).with_context(|| {
                    format!("AZURE_RESOURCE_MANAGER_ENDPOINT is not a valid URL: {raw}")
                })?;
                tracing::info!("Using Azure Resource Manager endpoint {url}");
                url
            }
            None => Url::parse(DEFAULT_ARM_ENDPOINT)?,
        };

        let fabric_api_version = lookup("MANAGED_FABRIC_API_VERSION")
            .unwrap_or_else(|| DEFAULT_FABRIC_API_VERSION.to_string());
        let resources_api_version = lookup("AZURE_RESOURCES_API_VERSION")
            .unwrap_or_else(|| DEFAULT_RESOURCES_API_VERSION.to_string());

        let poll_interval = seconds(&lookup, "AZURE_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let http_timeout = seconds(&lookup, "AZURE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        anyhow::ensure!(
            !http_timeout.is_zero(),
            "AZURE_HTTP_TIMEOUT_SECS must be greater than zero"
        );

        let access_token = lookup("AZURE_ACCESS_TOKEN").filter(|t| !t.trim().is_empty());
        if access_token.is_some() {
            tracing::info!("AZURE_ACCESS_TOKEN found, Azure CLI credential will not be used");
        }

        Ok(Config {
            access_token,
            arm: ArmConfig {
                endpoint,
                fabric_api_version,
                resources_api_version,
                poll_interval,
                http_timeout,
            },
        })
    }
}

fn seconds<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}"))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}
