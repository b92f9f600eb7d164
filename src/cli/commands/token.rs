use chrono::{TimeZone, Utc};
use clap::Args;
use serde_json::{json, Map};

use crate::auth::{generate_token, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "Subject (user id) claim")]
    pub sub: String,

    #[arg(long, help = "Email claim")]
    pub email: Option<String>,

    #[arg(long, help = "Display name claim")]
    pub name: Option<String>,

    #[arg(long, default_value_t = 24, help = "Hours until the token expires")]
    pub ttl_hours: i64,
}

/// Signed with AUTH_JWT_SECRET when configured, unsigned otherwise
pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let claims = Claims::new(args.sub, args.email, args.name, args.ttl_hours);
    let secret = config.auth.jwt_secret.as_deref();
    let token = generate_token(&claims, secret)?;

    match output_format {
        OutputFormat::Text => output_success(&output_format, &token, None),
        OutputFormat::Json => {
            let expires_at = claims
                .expires_at()
                .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
                .map(|at| at.to_rfc3339());

            let mut data = Map::new();
            data.insert("token".to_string(), json!(token));
            data.insert("signed".to_string(), json!(secret.is_some()));
            data.insert("expires_at".to_string(), json!(expires_at));
            output_success(&output_format, "Token issued", Some(data))
        }
    }
}
