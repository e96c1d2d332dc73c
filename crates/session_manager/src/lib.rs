//! session_manager - authentication lifecycle for the BloodLink client
//!
//! Owns login, registration with auto-login, logout, and cold-start
//! revalidation, and exposes the resulting session state as an observable
//! snapshot for the UI layer.

pub mod manager;
pub mod structs;

pub use manager::SessionManager;
pub use structs::{AuthOutcome, AuthPhase, SessionState};
