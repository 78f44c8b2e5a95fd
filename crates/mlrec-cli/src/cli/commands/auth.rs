//! Login and logout handlers.

use std::process::ExitCode;

use anyhow::Result;
use mlrec_core::credentials::CredentialStore;
use mlrec_core::ops::LoginOutcome;

use super::{RENDERED_FAILURE, RunContext};

pub async fn login(ctx: &RunContext<'_>, username: &str, password: &str) -> Result<ExitCode> {
    let console = ctx.console()?;
    let store = CredentialStore::default();

    match console.login(&store, username, password).await? {
        LoginOutcome::LoggedIn(stored) => {
            println!(
                "✓ Logged in as {}",
                stored.username.as_deref().unwrap_or(username)
            );
            println!("  Token saved to: {}", store.path().display());
            Ok(ExitCode::SUCCESS)
        }
        LoginOutcome::Rejected(message) => {
            eprintln!("❌ Login failed: {message}");
            Ok(ExitCode::from(RENDERED_FAILURE))
        }
    }
}

pub fn logout() -> Result<ExitCode> {
    let store = CredentialStore::default();

    if store.clear()? {
        println!("✓ Logged out");
        println!("  Credentials removed from: {}", store.path().display());
    } else {
        println!("Not logged in (no credentials found).");
    }

    Ok(ExitCode::SUCCESS)
}
