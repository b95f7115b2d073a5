//! Accounts, profiles, and password reset.

pub mod service;

pub use service::{AccountService, AuthSession, ProfilePicture, RegisterRequest, ResetKeyDocument};
