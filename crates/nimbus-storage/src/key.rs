//! Server-generated blob keys.

use std::fmt;

use chrono::Utc;
use rand::Rng;

use nimbus_core::types::UserId;

/// Longest extension carried over from the client-supplied name.
const MAX_EXTENSION_LEN: usize = 16;

/// A storage key of the form `{user_id}/{millis}-{random}{.ext}`.
///
/// Only the owner's id and a sanitized extension come from outside; the
/// rest is generated, so two uploads of the same name never collide and no
/// client input can shape the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobKey {
    owner: UserId,
    name: String,
}

impl BlobKey {
    /// Generate a fresh key for an upload by `owner` whose client filename
    /// was `original_name`.
    pub fn generate(owner: UserId, original_name: &str) -> Self {
        let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
        let name = format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            suffix,
            extension_of(original_name)
        );
        Self { owner, name }
    }

    /// Generate a fresh key for a profile picture.
    pub fn profile_picture(owner: UserId, original_name: &str) -> Self {
        let mut key = Self::generate(owner, original_name);
        key.name = format!("avatar-{}", key.name);
        key
    }

    /// The generated file name within the partition.
    pub fn file_name(&self) -> &str {
        &self.name
    }

    /// The full key as stored in the database.
    pub fn as_path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The extension of `original_name` including the dot, or an empty string
/// when there is none or it contains anything but ASCII alphanumerics.
fn extension_of(original_name: &str) -> String {
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or_default();
    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_partitioned_by_owner() {
        let key = BlobKey::generate(UserId::new(42), "holiday.MP4");
        let path = key.as_path();
        assert!(path.starts_with("42/"), "{path}");
        assert!(path.ends_with(".mp4"), "{path}");
    }

    #[test]
    fn test_keys_do_not_collide() {
        let a = BlobKey::generate(UserId::new(1), "a.txt");
        let b = BlobKey::generate(UserId::new(1), "a.txt");
        assert_ne!(a, b);
    }

    #[test]
    fn test_extension_sanitizing() {
        assert_eq!(extension_of("report.pdf"), ".pdf");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of("evil.p/../hp"), "");
        assert_eq!(extension_of("x.sh;rm"), "");
        assert_eq!(extension_of("C:\\docs\\letter.DOCX"), ".docx");
    }

    #[test]
    fn test_profile_picture_key() {
        let key = BlobKey::profile_picture(UserId::new(3), "me.png");
        assert!(key.file_name().starts_with("avatar-"));
        assert!(key.as_path().starts_with("3/avatar-"));
    }
}
