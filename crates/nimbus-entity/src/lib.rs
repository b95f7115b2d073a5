//! # nimbus-entity
//!
//! Domain entity models for Nimbus Drive. Every struct in this crate is a
//! database row or a domain value object. Rows derive `sqlx::FromRow` and
//! serialize with camelCase keys, which is the shape the HTTP API returns.

pub mod achievement;
pub mod file;
pub mod folder;
pub mod user;
