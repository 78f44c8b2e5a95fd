//! CLI command handlers.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use mlrec_core::api::MlClient;
use mlrec_core::config::{Config, resolve_base_url};
use mlrec_core::ops::{MlConsole, Outcome};
use mlrec_core::panel::ResultsPanel;
use mlrec_core::render::Renderer;

pub mod auth;
pub mod config;
pub mod ml;

/// Exit code for an operation that rendered an error or raised an alert.
const RENDERED_FAILURE: u8 = 2;

/// Global options shared by every command.
pub struct RunContext<'a> {
    pub config: &'a Config,
    pub base_url: Option<&'a str>,
    pub token: Option<&'a str>,
    pub out: Option<&'a Path>,
}

impl RunContext<'_> {
    /// Builds a console wired to the configured service and templates.
    fn console(&self) -> Result<MlConsole> {
        let client = MlClient::new(resolve_base_url(
            self.base_url,
            self.config.effective_base_url(),
        )?)?;
        tracing::debug!(base_url = client.base_url(), "Using ML service");

        let templates_dir = self.config.templates_dir();
        let renderer =
            Renderer::with_overrides(templates_dir.as_deref()).context("load templates")?;

        Ok(MlConsole::new(
            client,
            renderer,
            // Loading text goes to stderr so stdout stays the rendered fragment.
            Arc::new(ResultsPanel::new().on_begin(|_, loading| eprintln!("{loading}"))),
        )
        .with_recommendations(self.config.recommendations.clone()))
    }

    /// Writes a rendered fragment to `--out` or stdout.
    fn emit(&self, html: &str) -> Result<()> {
        match self.out {
            Some(path) => std::fs::write(path, format!("{html}\n"))
                .with_context(|| format!("write output to {}", path.display())),
            None => {
                println!("{html}");
                Ok(())
            }
        }
    }
}

fn exit_code(outcome: Outcome) -> ExitCode {
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(RENDERED_FAILURE)
    }
}
