//! User-facing ML operations.
//!
//! Each operation follows the same linear shape: check the credential, show a
//! loading message, make one request, render the result or the failure into
//! the results panel. Service failures never propagate as `Err`; they become
//! panel output. `Err` is reserved for local problems such as a broken
//! template or an unwritable credential file.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::api::types::Envelope;
use crate::api::{ApiError, MlClient};
use crate::config::RecommendationsConfig;
use crate::credentials::{Credential, CredentialStore, Session, StoredCredential};
use crate::panel::{RESULTS_REGION, ResultsPanel, Ticket};
use crate::render::{PredictionView, RecommendationsView, Renderer, StatusView, TrainingView};

pub const LOGIN_REQUIRED_ALERT: &str = "❌ Please log in first!";

pub const TRAIN_LOADING: &str = "🤖 Training ML model... (this can take 30-60 seconds)";
pub const RECOMMENDATIONS_LOADING: &str = "🎯 Fetching ML recommendations...";
pub const STATUS_LOADING: &str = "📊 Checking ML status...";
pub const PREDICTION_LOADING: &str = "🎯 Predicting rating...";

pub const TRAIN_FAILED_DEFAULT: &str = "ML training failed";
pub const RECOMMENDATIONS_FAILED_DEFAULT: &str = "Could not fetch ML recommendations";
pub const PREDICTION_FAILED_DEFAULT: &str = "Could not predict rating";

/// Regions used by [`MlConsole::dashboard`].
pub const STATUS_REGION: &str = "ml-status";
pub const RECOMMENDATIONS_REGION: &str = "ml-recommendations";

/// How an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The success template was rendered.
    Rendered,
    /// An application or network error was rendered.
    Failed,
    /// The credential was missing; an alert was raised and nothing was sent.
    LoginRequired,
    /// A newer request for the same region finished the job; this result was dropped.
    Superseded,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Rendered)
    }
}

/// Result of [`MlConsole::login`].
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    LoggedIn(StoredCredential),
    Rejected(String),
}

/// Binds a client, a renderer and a results panel together.
#[derive(Debug, Clone)]
pub struct MlConsole {
    client: MlClient,
    renderer: Arc<Renderer>,
    panel: Arc<ResultsPanel>,
    recommendations: RecommendationsConfig,
}

impl MlConsole {
    pub fn new(client: MlClient, renderer: Renderer, panel: Arc<ResultsPanel>) -> Self {
        Self {
            client,
            renderer: Arc::new(renderer),
            panel,
            recommendations: RecommendationsConfig::default(),
        }
    }

    #[must_use]
    pub fn with_recommendations(mut self, recommendations: RecommendationsConfig) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    /// Requires a credential, raising the login alert when absent.
    fn require_credential<'s>(&self, session: &'s Session, op: &str) -> Option<&'s Credential> {
        let credential = session.credential();
        if credential.is_none() {
            warn!(op, "No credential; skipping request");
            self.panel.alert(LOGIN_REQUIRED_ALERT);
        }
        credential
    }

    fn finish(&self, ticket: &Ticket, html: String, outcome: Outcome) -> Outcome {
        if self.panel.commit(ticket, html) {
            outcome
        } else {
            Outcome::Superseded
        }
    }

    fn fail_application(
        &self,
        ticket: &Ticket,
        envelope: &Envelope,
        default: &str,
    ) -> Result<Outcome> {
        let message = envelope
            .failure_message()
            .unwrap_or_else(|| default.to_string());
        warn!(region = ticket.region(), status = ?envelope.status, %message, "ML service reported failure");
        let html = self.renderer.error(&message)?;
        Ok(self.finish(ticket, html, Outcome::Failed))
    }

    fn fail_network(&self, ticket: &Ticket, error: &ApiError) -> Result<Outcome> {
        warn!(region = ticket.region(), kind = %error.kind, %error, "ML service call failed");
        let html = self.renderer.network_error(&error.to_string())?;
        Ok(self.finish(ticket, html, Outcome::Failed))
    }

    /// Starts model training on the server.
    ///
    /// # Errors
    /// Returns an error only if rendering fails.
    pub async fn train_model(&self, session: &Session) -> Result<Outcome> {
        let Some(credential) = self.require_credential(session, "train") else {
            return Ok(Outcome::LoginRequired);
        };

        let ticket = self.panel.begin(RESULTS_REGION, TRAIN_LOADING);
        info!("Requesting model training");

        match self.client.train(credential).await {
            Ok(response) if response.envelope.is_success() => {
                let view = TrainingView::new(response.ml_status.as_ref());
                let html = self.renderer.training(&view)?;
                Ok(self.finish(&ticket, html, Outcome::Rendered))
            }
            Ok(response) => self.fail_application(&ticket, &response.envelope, TRAIN_FAILED_DEFAULT),
            Err(error) => self.fail_network(&ticket, &error),
        }
    }

    /// Fetches and renders recommendations for the session's user.
    ///
    /// # Errors
    /// Returns an error only if rendering fails.
    pub async fn recommendations(&self, session: &Session) -> Result<Outcome> {
        self.recommendations_into(RESULTS_REGION, session).await
    }

    async fn recommendations_into(&self, region: &str, session: &Session) -> Result<Outcome> {
        let Some(credential) = self.require_credential(session, "recommendations") else {
            return Ok(Outcome::LoginRequired);
        };

        let ticket = self.panel.begin(region, RECOMMENDATIONS_LOADING);
        let count = self.recommendations.request_count;
        info!(count, "Requesting recommendations");

        match self.client.recommendations(credential, count).await {
            Ok(response) => match response.recommendations.as_deref() {
                Some(movies) if response.envelope.is_success() => {
                    let view =
                        RecommendationsView::new(movies, self.recommendations.display_limit);
                    info!(
                        received = movies.len(),
                        shown = view.movies.len(),
                        "Rendering recommendations"
                    );
                    let html = self.renderer.recommendations(&view)?;
                    Ok(self.finish(&ticket, html, Outcome::Rendered))
                }
                _ => self.fail_application(
                    &ticket,
                    &response.envelope,
                    RECOMMENDATIONS_FAILED_DEFAULT,
                ),
            },
            Err(error) => self.fail_network(&ticket, &error),
        }
    }

    /// Renders the ML subsystem status. Needs no credential.
    ///
    /// # Errors
    /// Returns an error only if rendering fails.
    pub async fn check_status(&self) -> Result<Outcome> {
        self.check_status_into(RESULTS_REGION).await
    }

    async fn check_status_into(&self, region: &str) -> Result<Outcome> {
        let ticket = self.panel.begin(region, STATUS_LOADING);
        info!("Requesting ML status");

        match self.client.status().await {
            Ok(response) => {
                let view = StatusView::new(response.ml_system.as_ref());
                let html = self.renderer.status(&view)?;
                Ok(self.finish(&ticket, html, Outcome::Rendered))
            }
            Err(error) => self.fail_network(&ticket, &error),
        }
    }

    /// Predicts the session user's rating for one movie.
    ///
    /// # Errors
    /// Returns an error only if rendering fails.
    pub async fn predict_rating(&self, session: &Session, movie_id: i64) -> Result<Outcome> {
        let Some(credential) = self.require_credential(session, "predict") else {
            return Ok(Outcome::LoginRequired);
        };

        let ticket = self.panel.begin(RESULTS_REGION, PREDICTION_LOADING);
        info!(movie_id, "Requesting rating prediction");

        match self.client.predict_rating(credential, movie_id).await {
            Ok(response) if response.envelope.is_success() => {
                let html = self.renderer.prediction(&PredictionView::from(&response))?;
                Ok(self.finish(&ticket, html, Outcome::Rendered))
            }
            Ok(response) => {
                self.fail_application(&ticket, &response.envelope, PREDICTION_FAILED_DEFAULT)
            }
            Err(error) => self.fail_network(&ticket, &error),
        }
    }

    /// Runs status and recommendations concurrently, each into its own
    /// region, and returns the combined fragment.
    ///
    /// # Errors
    /// Returns an error only if rendering fails.
    pub async fn dashboard(&self, session: &Session) -> Result<(String, Outcome)> {
        let (status, recommendations) = tokio::join!(
            self.check_status_into(STATUS_REGION),
            self.recommendations_into(RECOMMENDATIONS_REGION, session),
        );
        let (status, recommendations) = (status?, recommendations?);

        let regions: Vec<_> = self
            .panel
            .regions()
            .into_iter()
            .filter(|r| r.name == STATUS_REGION || r.name == RECOMMENDATIONS_REGION)
            .collect();
        let html = self.renderer.dashboard(&regions)?;

        let outcome = [status, recommendations]
            .into_iter()
            .find(|o| !o.is_success())
            .unwrap_or(Outcome::Rendered);
        Ok((html, outcome))
    }

    /// Exchanges username and password for a token and stores it.
    ///
    /// # Errors
    /// Returns an error if the credential cannot be saved.
    pub async fn login(
        &self,
        store: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome> {
        info!(username, "Logging in");

        let response = match self.client.login(username, password).await {
            Ok(response) => response,
            Err(error) => {
                warn!(kind = %error.kind, %error, "Login request failed");
                return Ok(LoginOutcome::Rejected(format!("Network error: {error}")));
            }
        };

        if !response.envelope.is_success() {
            let message = response
                .envelope
                .failure_message()
                .unwrap_or_else(|| "Login failed".to_string());
            return Ok(LoginOutcome::Rejected(message));
        }

        let Some(access_token) = response
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
        else {
            return Ok(LoginOutcome::Rejected(
                "Login response did not include an access token".to_string(),
            ));
        };

        let stored = StoredCredential {
            access_token,
            token_type: response
                .token_type
                .unwrap_or_else(|| "bearer".to_string()),
            username: response
                .user
                .and_then(|u| u.username)
                .or_else(|| Some(username.to_string())),
            saved_at: Utc::now(),
        };
        store.save(&stored)?;
        info!(username = ?stored.username, "Stored credential");

        Ok(LoginOutcome::LoggedIn(stored))
    }
}
