//! Session token utility for TenantSite
//!
//! Issues an HS256 bearer token for a user id, signed with
//! `AUTH_JWT_SECRET`. Useful for calling tenant routes from scripts.
//!
//! Usage:
//!   cargo run --bin issue-token -- user_123
//!   cargo run --bin issue-token -- user_123 72

use anyhow::{bail, Context};
use std::env;

use tenantsite_api::auth::JwtManager;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let Some(subject) = args.next() else {
        bail!("usage: issue-token <user-id> [expiry-hours]");
    };
    let expiry_hours: i64 = match args.next() {
        Some(hours) => hours.parse().context("expiry-hours must be an integer")?,
        None => 24,
    };

    let secret = env::var("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET is not set")?;
    if secret.len() < 32 {
        bail!("AUTH_JWT_SECRET must be at least 32 characters");
    }

    let token = JwtManager::new(&secret).issue_token(&subject, expiry_hours)?;
    println!("{token}");
    Ok(())
}
