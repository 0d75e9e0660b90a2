use serde_json::{json, Map};

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(
    config: &AppConfig,
    user: &str,
    hours: Option<u64>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let token = issue(config, user, hours)?;

    let mut data = Map::new();
    data.insert("user_id".to_string(), json!(user));
    data.insert("token".to_string(), json!(token));
    output_success(&output_format, "Token issued", &token, data)
}

fn issue(config: &AppConfig, user: &str, hours: Option<u64>) -> anyhow::Result<String> {
    if user.trim().is_empty() {
        anyhow::bail!("user id must not be empty");
    }

    let claims = Claims::new(user, hours.unwrap_or(config.security.jwt_expiry_hours))?;
    Ok(generate_jwt(&claims, &config.security.jwt_secret)?)
}
