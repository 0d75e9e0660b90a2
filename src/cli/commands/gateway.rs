use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::auth::SigningPolicy;
use crate::cli::utils::{bind, shutdown_signal};
use crate::config::AppConfig;
use crate::gateway::{self, GatewayState};
use crate::middleware::{AuthenticationGuard, MiddlewareChain, RateLimiter};
use crate::rpc::{DeviceRpcClient, UserRpcClient};

/// Stage order: rate limit (when enabled), then authentication
pub fn build_chain(config: &AppConfig) -> MiddlewareChain {
    let mut chain = MiddlewareChain::new();

    if config.rate_limit.enabled {
        chain = chain.stage(RateLimiter::with_limits(
            config.rate_limit.capacity,
            config.rate_limit.refill_per_sec,
        ));
    }

    let policy = if config.security.legacy_inverted_alg_check {
        tracing::warn!(
            "AUTH_LEGACY_INVERTED_ALG_CHECK is set: HMAC-signed tokens will be rejected"
        );
        SigningPolicy::LegacyInverted
    } else {
        SigningPolicy::RequireHmac
    };

    chain.stage(AuthenticationGuard::new(config.security.jwt_secret.clone()).with_policy(policy))
}

pub async fn run(config: &AppConfig, addr: Option<String>) -> anyhow::Result<()> {
    config.validate_gateway()?;

    let devices = DeviceRpcClient::new(&config.server.device_rpc_url)?;
    let users = UserRpcClient::new(&config.server.user_rpc_url)?;
    info!(
        device_service = %devices.base_url(),
        user_service = %users.base_url(),
        "Gateway backends configured"
    );

    let chain = build_chain(config);
    let app = gateway::router(
        GatewayState::new(Arc::new(devices), Arc::new(users)),
        chain.clone(),
        gateway::cors_layer(&config.security.cors_origins),
    );

    let addr = addr.unwrap_or_else(|| config.server.gateway_addr.clone());
    let listener = bind(&addr).await?;
    info!(addr = %addr, stages = ?chain.stage_names(), "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway failed")?;

    info!("Gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn rate_limit_precedes_auth() {
        let config = AppConfig::preset(Environment::Development);
        assert_eq!(build_chain(&config).stage_names(), vec!["rate_limit", "auth"]);
    }

    #[test]
    fn disabled_rate_limit_leaves_only_auth() {
        let mut config = AppConfig::preset(Environment::Development);
        config.rate_limit.enabled = false;
        assert_eq!(build_chain(&config).stage_names(), vec!["auth"]);
    }
}
