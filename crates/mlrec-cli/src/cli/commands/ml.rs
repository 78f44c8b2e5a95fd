//! ML operation handlers (train, recommend, status, predict, dashboard).

use std::process::ExitCode;

use anyhow::{Context, Result};
use mlrec_core::credentials::{CredentialStore, Session};
use mlrec_core::ops::{MlConsole, Outcome};
use mlrec_core::panel::RESULTS_REGION;

use super::{RunContext, exit_code};

fn session(ctx: &RunContext<'_>) -> Result<Session> {
    Session::resolve(ctx.token, &CredentialStore::default()).context("load credential")
}

/// Prints queued alerts to stderr, then the results region if it was written.
fn finish(ctx: &RunContext<'_>, console: &MlConsole, outcome: Outcome) -> Result<ExitCode> {
    let alerts = console.panel().take_alerts();
    for alert in &alerts {
        eprintln!("{alert}");
    }
    if outcome == Outcome::LoginRequired {
        eprintln!("Run `mlrec login` or pass --token to authenticate.");
    }

    if let Some(html) = console.panel().content(RESULTS_REGION) {
        ctx.emit(&html)?;
    }

    Ok(exit_code(outcome))
}

pub async fn train(ctx: &RunContext<'_>) -> Result<ExitCode> {
    let console = ctx.console()?;
    let session = session(ctx)?;
    let outcome = console.train_model(&session).await?;
    finish(ctx, &console, outcome)
}

pub async fn recommend(ctx: &RunContext<'_>) -> Result<ExitCode> {
    let console = ctx.console()?;
    let session = session(ctx)?;
    let outcome = console.recommendations(&session).await?;
    finish(ctx, &console, outcome)
}

pub async fn status(ctx: &RunContext<'_>) -> Result<ExitCode> {
    let console = ctx.console()?;
    let outcome = console.check_status().await?;
    finish(ctx, &console, outcome)
}

pub async fn predict(ctx: &RunContext<'_>, movie_id: i64) -> Result<ExitCode> {
    let console = ctx.console()?;
    let session = session(ctx)?;
    let outcome = console.predict_rating(&session, movie_id).await?;
    finish(ctx, &console, outcome)
}

pub async fn dashboard(ctx: &RunContext<'_>) -> Result<ExitCode> {
    let console = ctx.console()?;
    let session = session(ctx)?;
    let (html, outcome) = console.dashboard(&session).await?;

    for alert in console.panel().take_alerts() {
        eprintln!("{alert}");
    }
    ctx.emit(&html)?;

    Ok(exit_code(outcome))
}
