//! HTTP client for the Event Finder REST API.
//!
//! All backend traffic funnels through [`ApiClient::execute`], which attaches
//! the bearer token, normalizes errors into [`ApiError`], and handles the one
//! transport-level policy decision in the client: a 401/422 response carrying
//! a JWT error code wipes the persisted session before the error is surfaced,
//! so feature code never sees a stale token as an ordinary failure.

use crate::api::{
    AuthResponse, CreateEventPayload, CreateUserPayload, Event, LoginRequest, MessageResponse,
    User,
};
use crate::core::session::SessionStore;
use crate::utils::url::{construct_api_url, encode_path_segment, normalize_base_url};
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use tracing::{debug, warn};

const JWT_ERROR_CODES: [&str; 3] = ["JWT_MISSING", "JWT_INVALID", "JWT_EXPIRED"];

/// Every way a backend call can fail. Auth failures are terminal for the
/// session, not just the request: by the time a caller sees `AuthRequired`
/// the persisted session has already been cleared.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The server rejected the token (missing/invalid/expired). The local
    /// session has been wiped; the user must log in again.
    AuthRequired,
    /// Structured error body from a non-2xx response.
    Api {
        code: String,
        message: String,
        fields: Option<HashMap<String, Vec<String>>>,
    },
    /// Non-2xx response whose body was not valid JSON.
    Unknown { status: u16 },
    /// No response was obtained at all.
    Network(String),
    /// A 2xx response whose body did not match the expected shape.
    Decode(String),
}

impl ApiError {
    /// Stable error code, mirroring the backend's taxonomy where one exists.
    pub fn code(&self) -> &str {
        match self {
            ApiError::AuthRequired => "AUTH_REQUIRED",
            ApiError::Api { code, .. } => code,
            ApiError::Unknown { .. } => "UNKNOWN_ERROR",
            ApiError::Network(_) => "NETWORK_ERROR",
            ApiError::Decode(_) => "DECODE_ERROR",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::AuthRequired => {
                write!(f, "authentication required")
            }
            ApiError::Api { code, message, .. } => {
                if message.is_empty() {
                    write!(f, "{code}")
                } else {
                    write!(f, "{message} ({code})")
                }
            }
            ApiError::Unknown { status } => {
                write!(f, "request failed with status {status}")
            }
            ApiError::Network(detail) => {
                write!(f, "network request failed: {detail}")
            }
            ApiError::Decode(detail) => {
                write!(f, "unexpected response body: {detail}")
            }
        }
    }
}

impl StdError for ApiError {}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    fields: Option<HashMap<String, Vec<String>>>,
}

fn parse_error_detail(body: &str) -> Option<ErrorDetail> {
    serde_json::from_str::<ErrorBody>(body).ok()?.error
}

/// Single point of contact with the backend. The only component that reads
/// the persisted token on the request path and the only one allowed to clear
/// it.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(base_url),
            session,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = construct_api_url(&self.base_url, path);
        debug!(%method, %url, "sending API request");
        let mut builder = self
            .http
            .request(method, url)
            .header("Content-Type", "application/json");
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;

        // Kick the user back to `login` if the JWT is missing/invalid/expired.
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::UNPROCESSABLE_ENTITY {
            if let Some(detail) = parse_error_detail(&body) {
                if JWT_ERROR_CODES.contains(&detail.code.as_str()) {
                    warn!(code = %detail.code, "server rejected the session token, clearing session");
                    if let Err(err) = self.session.clear() {
                        warn!(%err, "failed to clear the persisted session");
                    }
                    return Err(ApiError::AuthRequired);
                }
            }
        }

        if !status.is_success() {
            return Err(match parse_error_detail(&body) {
                Some(detail) => ApiError::Api {
                    code: detail.code,
                    message: detail.message,
                    fields: detail.fields,
                },
                None => ApiError::Unknown {
                    status: status.as_u16(),
                },
            });
        }

        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    // -------- Auth --------

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/login")
            .json(&LoginRequest { email, password });
        self.execute(request).await
    }

    // -------- Chat --------

    /// Forward a free-text prompt to the AI endpoint. The response shape is
    /// intentionally open; interpretation lives in [`crate::core::chat`].
    pub async fn query_prompt(&self, prompt: &str) -> Result<Value, ApiError> {
        let path = format!("app/prompt?prompt={}", encode_path_segment(prompt));
        self.execute(self.request(Method::GET, &path)).await
    }

    // -------- Users --------

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<User, ApiError> {
        self.execute(self.request(Method::POST, "users").json(payload))
            .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, ApiError> {
        let path = format!("users/email/{}", encode_path_segment(email));
        self.execute(self.request(Method::GET, &path)).await
    }

    pub async fn get_users(&self) -> Result<Vec<User>, ApiError> {
        self.execute(self.request(Method::GET, "users")).await
    }

    // -------- Events --------

    pub async fn get_events(&self) -> Result<Vec<Event>, ApiError> {
        self.execute(self.request(Method::GET, "events")).await
    }

    pub async fn create_event(&self, payload: &CreateEventPayload) -> Result<Event, ApiError> {
        self.execute(self.request(Method::POST, "events").json(payload))
            .await
    }

    pub async fn get_event_by_title(&self, title: &str) -> Result<Event, ApiError> {
        let path = format!("events/title/{}", encode_path_segment(title));
        self.execute(self.request(Method::GET, &path)).await
    }

    pub async fn get_events_by_organizer(&self, email: &str) -> Result<Vec<Event>, ApiError> {
        let path = format!("events/organizer/{}", encode_path_segment(email));
        self.execute(self.request(Method::GET, &path)).await
    }

    pub async fn get_events_by_date(&self, date: NaiveDate) -> Result<Vec<Event>, ApiError> {
        let path = format!("events/date/{}", date.format("%Y-%m-%d"));
        self.execute(self.request(Method::GET, &path)).await
    }

    pub async fn update_event(
        &self,
        title: &str,
        payload: &CreateEventPayload,
    ) -> Result<Event, ApiError> {
        let path = format!("events/{}", encode_path_segment(title));
        self.execute(self.request(Method::PUT, &path).json(payload))
            .await
    }

    pub async fn delete_event(&self, title: &str) -> Result<MessageResponse, ApiError> {
        let path = format!("events/{}", encode_path_segment(title));
        self.execute(self.request(Method::DELETE, &path)).await
    }

    // The backend exposes no location/category endpoints; these are computed
    // client-side over the full event list.

    pub async fn get_events_by_location(&self, location: &str) -> Result<Vec<Event>, ApiError> {
        let needle = location.trim().to_lowercase();
        let events = self.get_events().await?;
        Ok(events
            .into_iter()
            .filter(|e| e.location.trim().to_lowercase() == needle)
            .collect())
    }

    pub async fn get_events_by_category(&self, category: &str) -> Result<Vec<Event>, ApiError> {
        let needle = category.trim().to_lowercase();
        let events = self.get_events().await?;
        Ok(events
            .into_iter()
            .filter(|e| e.category.trim().to_lowercase() == needle)
            .collect())
    }

    pub async fn get_categories(&self) -> Result<Vec<String>, ApiError> {
        let events = self.get_events().await?;
        Ok(distinct_sorted(events.iter().map(|e| e.category.as_str())))
    }

    pub async fn get_locations(&self) -> Result<Vec<String>, ApiError> {
        let events = self.get_events().await?;
        Ok(distinct_sorted(events.iter().map(|e| e.location.as_str())))
    }

    // -------- Participants --------
    // Participant routes are keyed by event title, the identifier the rest of
    // the API uses.

    pub async fn list_participants(&self, title: &str) -> Result<Vec<User>, ApiError> {
        let path = format!("app/{}/participants", encode_path_segment(title));
        self.execute(self.request(Method::GET, &path)).await
    }

    pub async fn add_participant(
        &self,
        title: &str,
        email: &str,
    ) -> Result<MessageResponse, ApiError> {
        let path = format!(
            "app/{}/participants/{}",
            encode_path_segment(title),
            encode_path_segment(email)
        );
        self.execute(self.request(Method::POST, &path)).await
    }

    pub async fn remove_participant(
        &self,
        title: &str,
        email: &str,
    ) -> Result<MessageResponse, ApiError> {
        let path = format!(
            "app/{}/participants/{}",
            encode_path_segment(title),
            encode_path_segment(email)
        );
        self.execute(self.request(Method::DELETE, &path)).await
    }
}

/// Distinct non-empty values, insertion-unique, sorted case-insensitively.
fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if !out.iter().any(|existing| existing == value) {
            out.push(value.to_string());
        }
    }
    out.sort_by_key(|v| v.to_lowercase());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{Session, SessionStore};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::at(dir.path().join("session.toml"))
    }

    fn authed_store(dir: &TempDir, token: &str) -> SessionStore {
        let store = store_in(dir);
        store
            .save(&Session {
                token: Some(token.to_string()),
                user: None,
            })
            .unwrap();
        store
    }

    fn jwt_error(code: &str) -> serde_json::Value {
        json!({"error": {"code": code, "message": "token rejected"}})
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_session_present() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(header("Authorization", "Bearer tok-42"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), authed_store(&dir, "tok-42"));
        let events = client.get_events().await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn omits_authorization_header_when_anonymous() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), store_in(&dir));
        client.get_events().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("Authorization").is_none());
    }

    #[tokio::test]
    async fn jwt_expired_clears_session_and_reports_auth_required() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(401).set_body_json(jwt_error("JWT_EXPIRED")))
            .mount(&server)
            .await;

        let store = authed_store(&dir, "stale");
        let client = ApiClient::new(&server.uri(), store.clone());
        let err = client.get_events().await.unwrap_err();

        assert_eq!(err, ApiError::AuthRequired);
        assert!(!store.is_authenticated());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn jwt_missing_on_422_also_forces_logout() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(422).set_body_json(jwt_error("JWT_MISSING")))
            .mount(&server)
            .await;

        let store = authed_store(&dir, "stale");
        let client = ApiClient::new(&server.uri(), store.clone());
        assert_eq!(client.get_events().await.unwrap_err(), ApiError::AuthRequired);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn non_jwt_401_is_a_structured_error_and_keeps_session() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"error": {"code": "INVALID_CREDENTIALS", "message": "Wrong password"}}),
            ))
            .mount(&server)
            .await;

        let store = authed_store(&dir, "still-good");
        let client = ApiClient::new(&server.uri(), store.clone());
        let err = client.login("ada@example.com", "nope").await.unwrap_err();

        match err {
            ApiError::Api { code, message, .. } => {
                assert_eq!(code, "INVALID_CREDENTIALS");
                assert_eq!(message, "Wrong password");
            }
            other => panic!("expected structured error, got {other:?}"),
        }
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn unparseable_error_body_maps_to_unknown() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), store_in(&dir));
        let err = client.get_events().await.unwrap_err();
        assert_eq!(err, ApiError::Unknown { status: 500 });
        assert_eq!(err.code(), "UNKNOWN_ERROR");
    }

    #[tokio::test]
    async fn unreachable_server_maps_to_network_error() {
        let dir = TempDir::new().unwrap();
        // Reserved port with nothing listening.
        let client = ApiClient::new("http://127.0.0.1:9", store_in(&dir));
        let err = client.get_events().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(err.code(), "NETWORK_ERROR");
    }

    #[tokio::test]
    async fn prompt_is_url_encoded() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/prompt"))
            .and(query_param("prompt", "tech events in Seattle"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), store_in(&dir));
        let response = client.query_prompt("tech events in Seattle").await.unwrap();
        assert_eq!(response["message"], "ok");
    }

    #[tokio::test]
    async fn location_filter_is_case_insensitive_and_client_side() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"title": "A", "datetime": "2024-05-01 18:00:00", "location": "Seattle "},
                {"title": "B", "datetime": "2024-05-02 18:00:00", "location": "Portland"},
                {"title": "C", "datetime": "2024-05-03 18:00:00", "location": "seattle"},
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), store_in(&dir));
        let events = client.get_events_by_location("SEATTLE").await.unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["A", "C"]);
    }

    #[tokio::test]
    async fn categories_are_distinct_and_sorted() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"title": "A", "datetime": "d", "category": "tech"},
                {"title": "B", "datetime": "d", "category": "Art"},
                {"title": "C", "datetime": "d", "category": "tech"},
                {"title": "D", "datetime": "d", "category": "  "},
                {"title": "E", "datetime": "d", "category": "music"},
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), store_in(&dir));
        let categories = client.get_categories().await.unwrap();
        assert_eq!(categories, ["Art", "music", "tech"]);
    }

    #[tokio::test]
    async fn participant_routes_encode_title_and_email() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/Demo%20Day/participants/ada%40example.com"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "added"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), store_in(&dir));
        let response = client
            .add_participant("Demo Day", "ada@example.com")
            .await
            .unwrap();
        assert_eq!(response.message, "added");
    }

    #[test]
    fn distinct_sorted_preserves_first_spelling() {
        let values = ["Tech", "tech", "Art", ""];
        let out = distinct_sorted(values.iter().copied());
        assert_eq!(out, ["Art", "Tech", "tech"]);
    }
}
