//! Session state types exposed to the UI layer

use app_core::UserProfile;
use serde::Serialize;
use serde_json::Value;

/// Lifecycle phase of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    /// Cold start; cached state is being revalidated.
    Initializing,
    Anonymous,
    /// A login or registration call is in flight.
    Authenticating,
    Authenticated,
    LoggingOut,
}

/// Observable snapshot of the authentication state.
///
/// `is_authenticated` is derived strictly from the presence of `user`;
/// `loading` is true only while a session operation is in flight.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: AuthPhase,
}

impl SessionState {
    pub(crate) fn initial() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
            phase: AuthPhase::Initializing,
        }
    }

    pub(crate) fn anonymous() -> Self {
        Self {
            user: None,
            loading: false,
            error: None,
            phase: AuthPhase::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Result of a login or registration call, shaped for direct consumption by
/// a form screen: either `data` or `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl AuthOutcome {
    pub(crate) fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_iff_user_present() {
        let mut state = SessionState::initial();
        assert!(!state.is_authenticated());

        state.user = Some(
            serde_json::from_value(serde_json::json!({"id": 1, "username": "alice"})).unwrap(),
        );
        assert!(state.is_authenticated());
    }

    #[test]
    fn initial_state_is_loading() {
        let state = SessionState::initial();
        assert!(state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.phase, AuthPhase::Initializing);
    }
}
