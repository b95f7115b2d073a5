//! Achievement evaluation.

pub mod service;

pub use service::{AchievementOverview, AchievementService};
