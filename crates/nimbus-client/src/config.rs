//! Client settings.

use std::time::Duration;

/// Where to upload and how patiently.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Bearer token from login.
    pub token: String,
    /// Whole-request timeout for one upload.
    pub timeout: Duration,
    /// Delay between starting consecutive transfers of a batch.
    pub stagger: Duration,
    /// How long a completed record stays visible before removal.
    pub removal_delay: Duration,
}

impl ClientConfig {
    /// Settings with default timings.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: Duration::from_secs(10 * 60),
            stagger: Duration::from_millis(50),
            removal_delay: Duration::from_secs(3),
        }
    }
}
