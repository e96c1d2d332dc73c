//! Session Manager service

use std::sync::Arc;

use api_client::{ApiClient, ApiError};
use app_core::{Credentials, RegisterRequest, UserProfile};
use log::{error, info, warn};
use serde_json::Value;
use storage_manager::{KeyValueStorage, ACCESS_TOKEN_KEY};
use tokio::sync::{watch, Mutex};

use crate::structs::{AuthOutcome, AuthPhase, SessionState};

const REGISTER_SUCCESS_MESSAGE: &str = "User registered successfully";

/// Orchestrates authentication state transitions.
///
/// Session-mutating operations (`login`, `register`, `logout`,
/// `check_auth_status`) are serialized through an internal lock, so
/// overlapping calls execute in order instead of racing on shared storage.
/// The current state is observable through [`SessionManager::subscribe`].
pub struct SessionManager {
    client: Arc<ApiClient>,
    state: watch::Sender<SessionState>,
    op_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(client: Arc<ApiClient>) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            client,
            state,
            op_lock: Mutex::new(()),
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch the session state for changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    /// Revalidate the session on cold start.
    ///
    /// Surfaces any cached profile immediately so the UI is not blocked on
    /// network I/O, then verifies the stored access token with a profile
    /// fetch. Never reports an error: a failed background revalidation just
    /// resolves to the anonymous state.
    pub async fn check_auth_status(&self) {
        let _guard = self.op_lock.lock().await;

        self.state.send_modify(|s| {
            s.loading = true;
            s.phase = AuthPhase::Initializing;
        });

        if let Some(cached) = self.client.cached_profile().await {
            // Optimistic and unverified; a successful fetch supersedes it.
            self.state.send_modify(|s| {
                s.user = Some(cached);
                s.phase = AuthPhase::Authenticated;
            });
        }

        let has_token = matches!(
            self.client.storage().get(ACCESS_TOKEN_KEY).await,
            Ok(Some(_))
        );
        if !has_token {
            self.client.clear_session().await;
            self.state.send_replace(SessionState::anonymous());
            return;
        }

        match self.client.get_profile().await {
            Ok(profile) => {
                if let Err(e) = self.client.cache_profile(&profile).await {
                    warn!("Failed to cache profile: {e}");
                }
                self.state.send_modify(|s| {
                    s.user = Some(profile);
                    s.loading = false;
                    s.error = None;
                    s.phase = AuthPhase::Authenticated;
                });
            }
            Err(e) => {
                info!("Background revalidation failed ({e}), falling back to anonymous");
                self.client.clear_session().await;
                self.state.send_replace(SessionState::anonymous());
            }
        }
    }

    pub async fn login(&self, credentials: Credentials) -> AuthOutcome {
        let _guard = self.op_lock.lock().await;
        self.login_locked(credentials).await
    }

    async fn login_locked(&self, credentials: Credentials) -> AuthOutcome {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
            s.phase = AuthPhase::Authenticating;
        });

        match self.perform_login(&credentials).await {
            Ok((tokens, profile)) => {
                self.state.send_modify(|s| {
                    s.user = Some(profile);
                    s.loading = false;
                    s.error = None;
                    s.phase = AuthPhase::Authenticated;
                });
                AuthOutcome::ok(tokens)
            }
            Err(e) => {
                error!("Login failed: {e}");
                let message = classify_login_error(&e);
                self.state.send_modify(|s| {
                    s.user = None;
                    s.loading = false;
                    s.error = Some(message.clone());
                    s.phase = AuthPhase::Anonymous;
                });
                AuthOutcome::failed(message)
            }
        }
    }

    async fn perform_login(
        &self,
        credentials: &Credentials,
    ) -> Result<(Value, UserProfile), ApiError> {
        let tokens = self.client.login(credentials).await?;
        let profile = self.client.get_profile().await?;
        if let Err(e) = self.client.cache_profile(&profile).await {
            warn!("Failed to cache profile: {e}");
        }
        let tokens = serde_json::to_value(tokens).unwrap_or(Value::Null);
        Ok((tokens, profile))
    }

    /// Register a new account and, on the backend's success message,
    /// immediately log in with the same credentials. Registration alone
    /// never authenticates the session.
    pub async fn register(&self, user_data: RegisterRequest) -> AuthOutcome {
        let _guard = self.op_lock.lock().await;

        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
            s.phase = AuthPhase::Authenticating;
        });

        match self.client.register(&user_data).await {
            Ok(response) => {
                let registered = response.get("message").and_then(Value::as_str)
                    == Some(REGISTER_SUCCESS_MESSAGE);
                if registered {
                    let credentials = Credentials {
                        username: user_data.username,
                        password: user_data.password,
                    };
                    return self.login_locked(credentials).await;
                }
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.phase = AuthPhase::Anonymous;
                });
                AuthOutcome::ok(response)
            }
            Err(e) => {
                error!("Registration failed: {e}");
                let message = classify_register_error(&e);
                self.state.send_modify(|s| {
                    s.user = None;
                    s.loading = false;
                    s.error = Some(message.clone());
                    s.phase = AuthPhase::Anonymous;
                });
                AuthOutcome::failed(message)
            }
        }
    }

    /// Log out. The server call is best-effort; local credentials and the
    /// cached profile are cleared unconditionally, so logout always succeeds
    /// from the caller's perspective, reachable network or not.
    pub async fn logout(&self) {
        let _guard = self.op_lock.lock().await;

        self.state.send_modify(|s| {
            s.loading = true;
            s.phase = AuthPhase::LoggingOut;
        });

        if let Err(e) = self.client.logout_server().await {
            warn!("Server logout failed, continuing with local logout: {e}");
        }

        self.client.clear_session().await;
        self.state.send_replace(SessionState::anonymous());
    }
}

fn classify_login_error(error: &ApiError) -> String {
    match error {
        ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
        ApiError::Server { message, .. } if message.contains("Invalid credentials") => {
            "Invalid username or password.".to_string()
        }
        ApiError::Server { message, .. } if !message.is_empty() => message.clone(),
        _ => "Login failed. Please try again.".to_string(),
    }
}

fn classify_register_error(error: &ApiError) -> String {
    match error {
        ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
        ApiError::Server { message, .. } if message.contains("already exists") => {
            "Username or email already exists.".to_string()
        }
        ApiError::Server { message, .. } if !message.is_empty() => message.clone(),
        _ => "Registration failed. Please try again.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(message: &str) -> ApiError {
        ApiError::Server {
            status: 400,
            message: message.to_string(),
        }
    }

    #[test]
    fn login_error_classification() {
        assert_eq!(
            classify_login_error(&ApiError::Network("connection refused".to_string())),
            "Network error. Please check your connection."
        );
        assert_eq!(
            classify_login_error(&server_error("Invalid credentials")),
            "Invalid username or password."
        );
        assert_eq!(
            classify_login_error(&server_error("Account disabled")),
            "Account disabled"
        );
        assert_eq!(
            classify_login_error(&ApiError::InvalidServerResponse),
            "Login failed. Please try again."
        );
    }

    #[test]
    fn register_error_classification() {
        assert_eq!(
            classify_register_error(&server_error("A user with that username already exists")),
            "Username or email already exists."
        );
        assert_eq!(
            classify_register_error(&ApiError::Network("timeout".to_string())),
            "Network error. Please check your connection."
        );
        assert_eq!(
            classify_register_error(&ApiError::InvalidServerResponse),
            "Registration failed. Please try again."
        );
    }
}
