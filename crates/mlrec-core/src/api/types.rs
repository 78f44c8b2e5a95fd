//! Response payloads returned by the ML service.
//!
//! Every field is optional: the service omits or nulls fields freely, and
//! error responses (`{"detail": ...}`) reuse the same shapes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status tag the service uses for successful calls.
pub const STATUS_SUCCESS: &str = "success";

/// Fields shared by every response body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Error body from the web framework on non-2xx responses.
    #[serde(default)]
    pub detail: Option<Value>,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }

    /// Server-supplied explanation for a failure, if any.
    pub fn failure_message(&self) -> Option<String> {
        let message = self
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        message.or_else(|| match self.detail.as_ref()? {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Null | Value::String(_) => None,
            other => Some(other.to_string()),
        })
    }
}

/// Matrix-dimension descriptor of the training data.
///
/// The service sends either a string or the dimensions of its user-item matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatrixShape {
    Dims(Vec<u64>),
    Text(String),
}

impl fmt::Display for MatrixShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixShape::Text(text) => f.write_str(text),
            MatrixShape::Dims(dims) => {
                let joined = dims
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(" x ");
                f.write_str(&joined)
            }
        }
    }
}

/// Readiness report of the ML subsystem.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MlStatus {
    #[serde(default)]
    pub ml_ready: Option<bool>,
    #[serde(default)]
    pub model_trained: Option<bool>,
    #[serde(default)]
    pub matrix_shape: Option<MatrixShape>,
}

impl MlStatus {
    pub fn is_ready(&self) -> bool {
        self.ml_ready.unwrap_or(false)
    }

    pub fn is_trained(&self) -> bool {
        self.model_trained.unwrap_or(false)
    }
}

/// `POST /ml/train`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub ml_status: Option<MlStatus>,
}

/// One recommended movie.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Movie {
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub predicted_rating: Option<f64>,
    #[serde(default)]
    pub ml_confidence: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

/// `GET /ml/recommendations`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub recommendations: Option<Vec<Movie>>,
    #[serde(default)]
    pub ml_status: Option<MlStatus>,
}

/// `GET /ml/status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub ml_system: Option<MlStatus>,
}

/// `POST /ml/predict-rating`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub movie_title: Option<String>,
    #[serde(default)]
    pub predicted_rating: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Body of `POST /login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

/// `POST /login`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
}
