//! Display models for the HTML templates.
//!
//! All fallbacks are resolved here so templates never see a missing value.

use serde::Serialize;

use crate::api::types::{MatrixShape, MlStatus, Movie, PredictionResponse};

/// Placeholder for values the service did not send.
pub const UNKNOWN: &str = "unknown";

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

fn yes_no_marked(flag: bool) -> &'static str {
    if flag { "Yes ✅" } else { "No ❌" }
}

/// An empty shape (`""` or `[]`) counts as missing.
fn shape_or_unknown(shape: Option<&MatrixShape>) -> String {
    shape
        .map(ToString::to_string)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn rating_or_unknown(rating: Option<f64>) -> String {
    rating.map_or_else(|| UNKNOWN.to_string(), |r| format!("{r:.2}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingView {
    pub matrix_shape: String,
    pub ready: &'static str,
}

impl TrainingView {
    pub fn new(status: Option<&MlStatus>) -> Self {
        Self {
            matrix_shape: shape_or_unknown(status.and_then(|s| s.matrix_shape.as_ref())),
            ready: yes_no(status.is_some_and(MlStatus::is_ready)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieView {
    pub title: String,
    pub rating: String,
    pub release_date: String,
    pub genres: String,
}

impl From<&Movie> for MovieView {
    fn from(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            rating: rating_or_unknown(movie.predicted_rating),
            release_date: movie
                .release_date
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            genres: movie
                .genres
                .as_deref()
                .map(|genres| genres.join(", "))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationsView {
    pub movies: Vec<MovieView>,
}

impl RecommendationsView {
    /// Keeps the first `limit` movies in server order.
    pub fn new(movies: &[Movie], limit: usize) -> Self {
        Self {
            movies: movies.iter().take(limit).map(MovieView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub ready: &'static str,
    pub trained: &'static str,
    pub matrix_shape: String,
}

impl StatusView {
    pub fn new(system: Option<&MlStatus>) -> Self {
        Self {
            ready: yes_no_marked(system.is_some_and(MlStatus::is_ready)),
            trained: yes_no_marked(system.is_some_and(MlStatus::is_trained)),
            matrix_shape: shape_or_unknown(system.and_then(|s| s.matrix_shape.as_ref())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionView {
    pub title: String,
    pub rating: String,
    pub confidence: String,
}

impl From<&PredictionResponse> for PredictionView {
    fn from(response: &PredictionResponse) -> Self {
        let title = response
            .movie_title
            .clone()
            .or_else(|| response.movie_id.map(|id| format!("Movie #{id}")))
            .unwrap_or_else(|| UNKNOWN.to_string());

        Self {
            title,
            rating: rating_or_unknown(response.predicted_rating),
            confidence: response.confidence.map_or_else(
                || UNKNOWN.to_string(),
                |c| format!("{:.0}%", c.clamp(0.0, 1.0) * 100.0),
            ),
        }
    }
}
