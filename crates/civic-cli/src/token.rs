//! # Token Subcommand
//!
//! Mints an HS256 bearer token with the same claims the identity provider
//! issues, for exercising the API locally.

use anyhow::{anyhow, bail, Result};
use clap::{Args, ValueEnum};
use uuid::Uuid;

use civic_api::auth::{AuthConfig, SecretToken};
use civic_state::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Citizen,
    Official,
}

impl From<RoleArg> for Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Citizen => Role::Citizen,
            RoleArg::Official => Role::Official,
        }
    }
}

/// Arguments for `civic token`.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// User id to embed in the token.
    #[arg(long)]
    pub user: Uuid,

    #[arg(long, value_enum)]
    pub role: RoleArg,

    /// Lifetime in hours.
    #[arg(long, default_value_t = 24)]
    pub ttl_hours: i64,

    /// Signing secret. Falls back to the JWT_SECRET environment variable.
    #[arg(long)]
    pub secret: Option<String>,
}

/// Mint a token for `args`, using `env_secret` when no `--secret` is given.
pub fn mint(args: &TokenArgs, env_secret: Option<String>) -> Result<String> {
    if args.ttl_hours <= 0 {
        bail!("--ttl-hours must be positive");
    }
    let raw = args
        .secret
        .clone()
        .or(env_secret)
        .ok_or_else(|| anyhow!("no secret: pass --secret or set JWT_SECRET"))?;
    let secret = SecretToken::new(raw).map_err(|e| anyhow!(e))?;
    AuthConfig::new(&secret)
        .issue(args.user, args.role.into(), chrono::Duration::hours(args.ttl_hours))
        .map_err(|e| anyhow!(e))
}

pub fn run_token(args: &TokenArgs) -> Result<u8> {
    let token = mint(args, std::env::var("JWT_SECRET").ok())?;
    tracing::info!(user = %args.user, role = ?args.role, "token minted");
    println!("{token}");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "cli-test-secret-0123456789abcdef012345";

    fn args(secret: Option<&str>) -> TokenArgs {
        TokenArgs {
            user: Uuid::new_v4(),
            role: RoleArg::Official,
            ttl_hours: 1,
            secret: secret.map(str::to_string),
        }
    }

    #[test]
    fn minted_token_verifies() {
        let a = args(Some(SECRET));
        let token = mint(&a, None).unwrap();
        let config = AuthConfig::new(&SecretToken::new(SECRET).unwrap());
        let identity = config.verify(&token).unwrap();
        assert_eq!(identity.user_id, a.user);
        assert_eq!(identity.role, Role::Official);
    }

    #[test]
    fn env_secret_is_fallback() {
        assert!(mint(&args(None), Some(SECRET.to_string())).is_ok());
        assert!(mint(&args(None), None).is_err());
    }

    #[test]
    fn short_secret_rejected() {
        assert!(mint(&args(Some("short")), None).is_err());
    }

    #[test]
    fn non_positive_ttl_rejected() {
        let mut a = args(Some(SECRET));
        a.ttl_hours = 0;
        assert!(mint(&a, None).is_err());
    }
}
