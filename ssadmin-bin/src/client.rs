use crate::options::{Config, HeaderMapExt};
use crate::parse::parse_duration_secs;
use anyhow::{Context, Result, anyhow};
use http::HeaderMap;
use ssadmin_lib::ratelimit::RateGovernor;
use ssadmin_lib::{ApiClient, ApiClientBuilder};
use std::sync::Arc;

/// Creates the rate governor shared by all calls of this run
pub(crate) fn create_governor(cfg: &Config) -> Arc<RateGovernor> {
    Arc::new(RateGovernor::new(cfg.rate_limits(), cfg.hosts.clone()))
}

/// Creates a client according to the command-line config
pub(crate) fn create(cfg: &Config, governor: Arc<RateGovernor>) -> Result<ApiClient> {
    let base_url = cfg.security_server.clone().ok_or_else(|| {
        anyhow!("No security server given, use `--security-server` or `security_server` in the config file")
    })?;
    let headers = HeaderMap::from_header_pairs(&cfg.header)?;

    ApiClientBuilder::builder()
        .base_url(base_url)
        .api_base_path(cfg.api_base_path.clone())
        .api_key(cfg.api_key.clone())
        .user_agent(cfg.user_agent.clone())
        .custom_headers(headers)
        .timeout(Some(parse_duration_secs(cfg.timeout)))
        .allow_insecure(cfg.insecure)
        .governor(governor)
        .build()
        .client()
        .context("Failed to create request client")
}
