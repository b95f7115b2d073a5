//! Achievement catalog and unlock records.

pub mod model;

pub use model::{Achievement, AchievementMetric, UserAchievement};
