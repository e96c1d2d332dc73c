//! app_core - shared configuration and data models for the BloodLink client

pub mod config;
pub mod models;

pub use config::Config;
pub use models::{AccessToken, Credentials, RegisterRequest, TokenPair, UserProfile};
