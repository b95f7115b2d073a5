//! # nimbus-auth
//!
//! Credentials for Nimbus Drive.
//!
//! ## Modules
//!
//! - `jwt`: bearer token creation and validation
//! - `password`: Argon2id hashing and the length policy
//! - `reset_key`: generation of single-use password reset keys

pub mod jwt;
pub mod password;
pub mod reset_key;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PasswordValidator};
pub use reset_key::generate_reset_key;
