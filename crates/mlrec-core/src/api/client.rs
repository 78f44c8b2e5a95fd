use anyhow::{Context, Result};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use super::types::{
    LoginRequest, LoginResponse, PredictionResponse, RecommendationsResponse, StatusResponse,
    TrainResponse,
};
use super::{ApiError, ApiResult};
use crate::credentials::Credential;

/// Standard User-Agent header for mlrec API requests.
pub const USER_AGENT: &str = concat!("mlrec/", env!("CARGO_PKG_VERSION"));

const TRAIN_PATH: &str = "/ml/train";
const RECOMMENDATIONS_PATH: &str = "/ml/recommendations";
const STATUS_PATH: &str = "/ml/status";
const PREDICT_PATH: &str = "/ml/predict-rating";
const LOGIN_PATH: &str = "/login";

/// ML service client.
///
/// Each call performs exactly one request: no retries, no timeout.
#[derive(Debug, Clone)]
pub struct MlClient {
    base_url: String,
    http: reqwest::Client,
}

impl MlClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client (TLS backend) cannot be initialized.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Starts model training.
    ///
    /// # Errors
    /// Returns an error on transport failure or an uninterpretable body.
    pub async fn train(&self, credential: &Credential) -> ApiResult<TrainResponse> {
        let builder = self
            .http
            .post(self.url(TRAIN_PATH))
            .header("authorization", credential.bearer())
            .header("content-type", "application/json");
        self.send(builder, TRAIN_PATH).await
    }

    /// Fetches up to `count` recommendations for the authenticated user.
    ///
    /// # Errors
    /// Returns an error on transport failure or an uninterpretable body.
    pub async fn recommendations(
        &self,
        credential: &Credential,
        count: u32,
    ) -> ApiResult<RecommendationsResponse> {
        let builder = self
            .http
            .get(self.url(RECOMMENDATIONS_PATH))
            .query(&[("n_recommendations", count)])
            .header("authorization", credential.bearer());
        self.send(builder, RECOMMENDATIONS_PATH).await
    }

    /// Reads the ML subsystem status. Unauthenticated.
    ///
    /// # Errors
    /// Returns an error on transport failure or an uninterpretable body.
    pub async fn status(&self) -> ApiResult<StatusResponse> {
        let builder = self.http.get(self.url(STATUS_PATH));
        self.send(builder, STATUS_PATH).await
    }

    /// Predicts the authenticated user's rating for one movie.
    ///
    /// # Errors
    /// Returns an error on transport failure or an uninterpretable body.
    pub async fn predict_rating(
        &self,
        credential: &Credential,
        movie_id: i64,
    ) -> ApiResult<PredictionResponse> {
        let builder = self
            .http
            .post(self.url(PREDICT_PATH))
            .query(&[("movie_id", movie_id)])
            .header("authorization", credential.bearer());
        self.send(builder, PREDICT_PATH).await
    }

    /// Exchanges username and password for an access token.
    ///
    /// # Errors
    /// Returns an error on transport failure or an uninterpretable body.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let builder = self
            .http
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest { username, password });
        self.send(builder, LOGIN_PATH).await
    }

    /// Sends a request and decodes the JSON body.
    ///
    /// Non-2xx responses whose body still decodes (e.g. `{"detail": ...}`) are
    /// returned as values so callers can show the server's message.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        endpoint: &str,
    ) -> ApiResult<T> {
        let response = builder
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::transport(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::transport(&e))?;
        tracing::debug!(endpoint, status = status.as_u16(), bytes = body.len(), "ML service responded");

        match serde_json::from_str::<T>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ApiError::http_status(status.as_u16(), &body)),
            Err(e) => Err(ApiError::parse(&e, &body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiErrorKind;

    fn token() -> Credential {
        Credential::new("test-token").unwrap()
    }

    #[tokio::test]
    async fn test_train_sends_bearer_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ml/train"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "ml_status": {"ml_ready": true, "model_trained": true, "matrix_shape": [3, 4]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MlClient::new(server.uri()).unwrap();
        let response = client.train(&token()).await.unwrap();
        assert!(response.envelope.is_success());
        assert!(response.ml_status.unwrap().is_ready());
    }

    #[tokio::test]
    async fn test_recommendations_sends_count_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/recommendations"))
            .and(query_param("n_recommendations", "10"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "recommendations": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MlClient::new(format!("{}/", server.uri())).unwrap();
        let response = client.recommendations(&token(), 10).await.unwrap();
        assert_eq!(response.recommendations.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_new_builds_client_with_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/status"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = MlClient::new(format!("{}//", server.uri())).unwrap();
        assert_eq!(client.base_url(), server.uri());
        client.status().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_is_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "ml_system": {"ml_ready": false, "model_trained": false}
            })))
            .mount(&server)
            .await;

        let client = MlClient::new(server.uri()).unwrap();
        client.status().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_error_detail_body_is_returned_as_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ml/train"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})),
            )
            .mount(&server)
            .await;

        let client = MlClient::new(server.uri()).unwrap();
        let response = client.train(&token()).await.unwrap();
        assert_eq!(
            response.envelope.failure_message().as_deref(),
            Some("Not authenticated")
        );
    }

    #[tokio::test]
    async fn test_non_json_error_is_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/status"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = MlClient::new(server.uri()).unwrap();
        let err = client.status().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::HttpStatus);
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }

    #[tokio::test]
    async fn test_non_json_success_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ml/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = MlClient::new(server.uri()).unwrap();
        let err = client.status().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        // Port 9 (discard) is not expected to accept HTTP connections.
        let client = MlClient::new("http://127.0.0.1:9").unwrap();
        let err = client.status().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Transport);
        assert!(!err.message.is_empty());
    }

    #[tokio::test]
    async fn test_predict_and_login_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ml/predict-rating"))
            .and(query_param("movie_id", "50"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "movie_id": 50,
                "movie_title": "Star Wars (1977)",
                "predicted_rating": 4.5,
                "confidence": 0.9
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({"username": "alice", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "access_token": "jwt",
                "token_type": "bearer",
                "user": {"id": 1, "username": "alice"}
            })))
            .mount(&server)
            .await;

        let client = MlClient::new(server.uri()).unwrap();
        let prediction = client.predict_rating(&token(), 50).await.unwrap();
        assert_eq!(prediction.movie_title.as_deref(), Some("Star Wars (1977)"));

        let login = client.login("alice", "pw").await.unwrap();
        assert_eq!(login.access_token.as_deref(), Some("jwt"));
    }
}
