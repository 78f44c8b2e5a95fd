//! HTML fragment rendering (`MiniJinja`).
//!
//! Templates are embedded at compile time. Names end in `.html`, which turns
//! on HTML auto-escaping for every interpolated value, so titles or error
//! messages coming from the service cannot inject markup.

pub mod views;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{Environment, UndefinedBehavior, context};
use serde::Serialize;

use crate::panel::RegionView;
pub use views::{
    MovieView, PredictionView, RecommendationsView, StatusView, TrainingView, UNKNOWN,
};

pub const TRAIN_TEMPLATE: &str = "train.html";
pub const RECOMMENDATIONS_TEMPLATE: &str = "recommendations.html";
pub const STATUS_TEMPLATE: &str = "status.html";
pub const PREDICTION_TEMPLATE: &str = "prediction.html";
pub const ERROR_TEMPLATE: &str = "error.html";
pub const NETWORK_ERROR_TEMPLATE: &str = "network_error.html";
pub const DASHBOARD_TEMPLATE: &str = "dashboard.html";

macro_rules! builtin {
    ($name:literal) => {
        ($name, include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/", $name)))
    };
}

/// Built-in templates, keyed by name.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    builtin!("train.html"),
    builtin!("recommendations.html"),
    builtin!("status.html"),
    builtin!("prediction.html"),
    builtin!("error.html"),
    builtin!("network_error.html"),
    builtin!("dashboard.html"),
];

#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Creates a renderer with the built-in templates only.
    ///
    /// # Errors
    /// Returns an error if a built-in template fails to compile.
    pub fn new() -> Result<Self> {
        Self::with_overrides(None)
    }

    /// Creates a renderer, replacing built-ins with same-named files from
    /// `overrides` when present.
    ///
    /// # Errors
    /// Returns an error if an override cannot be read or any template fails to compile.
    pub fn with_overrides(overrides: Option<&Path>) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        for &(name, source) in BUILTIN_TEMPLATES {
            let override_path = overrides.map(|dir| dir.join(name)).filter(|p| p.is_file());
            if let Some(path) = override_path {
                let source = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read template {}", path.display()))?;
                tracing::debug!(template = name, path = %path.display(), "Using template override");
                env.add_template_owned(name, source)
                    .with_context(|| format!("Failed to compile template {}", path.display()))?;
            } else {
                env.add_template(name, source)
                    .with_context(|| format!("Failed to compile built-in template {name}"))?;
            }
        }

        Ok(Self { env })
    }

    /// Renders a named template with the given context.
    ///
    /// # Errors
    /// Returns an error if the template is unknown or rendering fails.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let output = self
            .env
            .get_template(name)
            .with_context(|| format!("Unknown template {name}"))?
            .render(ctx)
            .with_context(|| format!("Failed to render template {name}"))?;
        Ok(output.replace("\r\n", "\n"))
    }

    /// # Errors
    /// Returns an error if rendering fails.
    pub fn training(&self, view: &TrainingView) -> Result<String> {
        self.render(TRAIN_TEMPLATE, view)
    }

    /// # Errors
    /// Returns an error if rendering fails.
    pub fn recommendations(&self, view: &RecommendationsView) -> Result<String> {
        self.render(RECOMMENDATIONS_TEMPLATE, view)
    }

    /// # Errors
    /// Returns an error if rendering fails.
    pub fn status(&self, view: &StatusView) -> Result<String> {
        self.render(STATUS_TEMPLATE, view)
    }

    /// # Errors
    /// Returns an error if rendering fails.
    pub fn prediction(&self, view: &PredictionView) -> Result<String> {
        self.render(PREDICTION_TEMPLATE, view)
    }

    /// Application-level failure reported by the service.
    ///
    /// # Errors
    /// Returns an error if rendering fails.
    pub fn error(&self, message: &str) -> Result<String> {
        self.render(ERROR_TEMPLATE, context! { message })
    }

    /// Transport or decoding failure.
    ///
    /// # Errors
    /// Returns an error if rendering fails.
    pub fn network_error(&self, error: &str) -> Result<String> {
        self.render(NETWORK_ERROR_TEMPLATE, context! { error })
    }

    /// Combines already-rendered regions into one fragment.
    ///
    /// # Errors
    /// Returns an error if rendering fails.
    pub fn dashboard(&self, regions: &[RegionView]) -> Result<String> {
        #[derive(Serialize)]
        struct RegionCtx<'a> {
            name: &'a str,
            html: &'a str,
        }

        let regions: Vec<RegionCtx<'_>> = regions
            .iter()
            .map(|r| RegionCtx {
                name: &r.name,
                html: &r.html,
            })
            .collect();
        self.render(DASHBOARD_TEMPLATE, context! { regions })
    }
}
