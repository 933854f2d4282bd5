//! Login/logout lifecycle against the event service.
//!
//! The session moves between two states: anonymous and authenticated. A
//! successful login stores the token, then fetches and stores the full
//! profile; any failure along the way rolls the session back to anonymous.
//! `login` reports failure as a value, never as an `Err`.

use crate::api::client::{ApiClient, ApiError};
use crate::api::User;
use crate::core::session::{Session, SessionError, SessionStore};

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success { user: User },
    Failure { message: String },
}

impl LoginOutcome {
    fn failure(message: impl Into<String>) -> Self {
        LoginOutcome::Failure {
            message: message.into(),
        }
    }
}

pub struct AuthManager {
    session: SessionStore,
}

impl AuthManager {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub async fn login(&self, client: &ApiClient, email: &str, password: &str) -> LoginOutcome {
        let token = match client.login(email, password).await {
            Ok(auth) => auth.access_token,
            Err(err) => return LoginOutcome::failure(login_error_message(&err)),
        };

        // The profile fetch below needs the token on the wire, so it is
        // persisted before the full session is.
        if let Err(err) = self.session.save(&Session {
            token: Some(token.clone()),
            user: None,
        }) {
            return LoginOutcome::failure(format!("Could not persist session: {err}"));
        }

        match client.get_user_by_email(email).await {
            Ok(profile) => {
                let session = Session {
                    token: Some(token),
                    user: Some(profile.clone()),
                };
                if let Err(err) = self.session.save(&session) {
                    let _ = self.session.clear();
                    return LoginOutcome::failure(format!("Could not persist session: {err}"));
                }
                LoginOutcome::Success { user: profile }
            }
            Err(err) => {
                let _ = self.session.clear();
                LoginOutcome::failure(format!("Logged in, but loading your profile failed: {err}"))
            }
        }
    }

    /// Idempotent: clearing an anonymous session is a no-op.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.session.clear()
    }
}

fn login_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Api { code, message, .. } if !message.is_empty() => {
            format!("{message} ({code})")
        }
        ApiError::Api { code, .. } => format!("Login failed: {code}"),
        other => format!("Login failed: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SessionStore;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn setup(server: &MockServer, dir: &TempDir) -> (ApiClient, AuthManager, SessionStore) {
        let store = SessionStore::at(dir.path().join("session.toml"));
        let client = ApiClient::new(&server.uri(), store.clone());
        let auth = AuthManager::new(store.clone());
        (client, auth, store)
    }

    #[tokio::test]
    async fn successful_login_stores_token_and_profile_together() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(
                json!({"email": "ada@example.com", "password": "s3cret"}),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/email/ada%40example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"name": "Ada", "surname": "Lovelace", "email": "ada@example.com"}),
            ))
            .mount(&server)
            .await;

        let (client, auth, store) = setup(&server, &dir);
        let outcome = auth.login(&client, "ada@example.com", "s3cret").await;

        match outcome {
            LoginOutcome::Success { user } => assert_eq!(user.name, "Ada"),
            LoginOutcome::Failure { message } => panic!("login failed: {message}"),
        }
        let session = store.load();
        assert_eq!(session.token.as_deref(), Some("tok-1"));
        assert_eq!(
            session.user.map(|u| u.email),
            Some("ada@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn wrong_password_reports_failure_without_touching_session() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"error": {"code": "INVALID_CREDENTIALS", "message": "Wrong password"}}),
            ))
            .mount(&server)
            .await;

        let (client, auth, store) = setup(&server, &dir);
        let outcome = auth.login(&client, "ada@example.com", "nope").await;

        match outcome {
            LoginOutcome::Failure { message } => {
                assert!(message.contains("INVALID_CREDENTIALS"));
                assert!(message.contains("Wrong password"));
            }
            LoginOutcome::Success { .. } => panic!("expected failure"),
        }
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn failed_profile_fetch_rolls_the_session_back() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/email/ada%40example.com"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (client, auth, store) = setup(&server, &dir);
        let outcome = auth.login(&client, "ada@example.com", "s3cret").await;

        assert!(matches!(outcome, LoginOutcome::Failure { .. }));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path().join("session.toml"));
        let auth = AuthManager::new(store.clone());
        auth.logout().unwrap();
        store
            .save(&Session {
                token: Some("tok".to_string()),
                user: None,
            })
            .unwrap();
        auth.logout().unwrap();
        auth.logout().unwrap();
        assert!(!store.is_authenticated());
    }
}
