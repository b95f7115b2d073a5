//! Route handlers organized by domain.

pub mod achievement;
pub mod auth;
pub mod file;
pub mod folder;
pub mod health;
pub mod media;
pub mod profile;
