//! Achievement evaluation over file and folder counts.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use nimbus_core::error::AppError;
use nimbus_database::repositories::{
    AchievementRepository, FileQuery, FileRepository, FolderRepository,
};
use nimbus_entity::achievement::{Achievement, AchievementMetric, UserAchievement};
use nimbus_entity::file::FileCategory;

use crate::context::RequestContext;

/// Evaluates and records achievement unlocks.
#[derive(Debug, Clone)]
pub struct AchievementService {
    achievement_repo: Arc<AchievementRepository>,
    file_repo: Arc<FileRepository>,
    folder_repo: Arc<FolderRepository>,
}

/// Catalog, unlocks, and what was unlocked by this very call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementOverview {
    /// Full catalog.
    pub achievements: Vec<Achievement>,
    /// Every unlock the user holds, new ones included.
    pub user_achievements: Vec<UserAchievement>,
    /// Unlocks created by this evaluation.
    pub new_unlocked: Vec<UserAchievement>,
}

/// Counts an achievement threshold is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Stats {
    files: u64,
    folders: u64,
    favorites: u64,
    images: u64,
    videos: u64,
    documents: u64,
    nested_folders: bool,
}

impl Stats {
    fn value(&self, metric: AchievementMetric) -> u64 {
        match metric {
            AchievementMetric::Files => self.files,
            AchievementMetric::Folders => self.folders,
            AchievementMetric::Favorites => self.favorites,
            AchievementMetric::Images => self.images,
            AchievementMetric::Videos => self.videos,
            AchievementMetric::Documents => self.documents,
            AchievementMetric::NestedFolders => u64::from(self.nested_folders),
            AchievementMetric::Always => 1,
        }
    }
}

impl AchievementService {
    /// Creates a new achievement service.
    pub fn new(
        achievement_repo: Arc<AchievementRepository>,
        file_repo: Arc<FileRepository>,
        folder_repo: Arc<FolderRepository>,
    ) -> Self {
        Self {
            achievement_repo,
            file_repo,
            folder_repo,
        }
    }

    /// Runs the unlock check and returns the full picture.
    pub async fn overview(&self, ctx: &RequestContext) -> Result<AchievementOverview, AppError> {
        let new_unlocked = self.check_and_unlock(ctx).await?;
        Ok(AchievementOverview {
            achievements: self.achievement_repo.list_catalog().await?,
            user_achievements: self.achievement_repo.list_for_user(ctx.user_id).await?,
            new_unlocked,
        })
    }

    /// Unlock records the user already holds.
    pub async fn user_achievements(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<UserAchievement>, AppError> {
        self.achievement_repo.list_for_user(ctx.user_id).await
    }

    /// Unlocks every achievement whose threshold the user now meets.
    ///
    /// Returns only rows created by this call; running it again with
    /// unchanged counts returns nothing.
    pub async fn check_and_unlock(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<UserAchievement>, AppError> {
        let stats = self.stats(ctx).await?;
        let held: HashSet<_> = self
            .achievement_repo
            .list_for_user(ctx.user_id)
            .await?
            .into_iter()
            .map(|ua| ua.achievement_id)
            .collect();

        let mut unlocked = Vec::new();
        for achievement in self.achievement_repo.list_catalog().await? {
            if held.contains(&achievement.id) {
                continue;
            }
            let Some(metric) = achievement.metric() else {
                continue;
            };
            let progress = stats.value(metric);
            if progress < achievement.requirement.max(0) as u64 {
                continue;
            }

            let progress = i64::try_from(progress).unwrap_or(i64::MAX);
            if let Some(row) = self
                .achievement_repo
                .unlock(ctx.user_id, achievement.id, progress)
                .await?
            {
                info!(
                    user_id = %ctx.user_id,
                    achievement = %achievement.key,
                    "Achievement unlocked"
                );
                unlocked.push(row);
            }
        }

        Ok(unlocked)
    }

    async fn stats(&self, ctx: &RequestContext) -> Result<Stats, AppError> {
        let owner = ctx.user_id;
        let count_category = |category: FileCategory| {
            let mut query = FileQuery::active(owner);
            if let Some(filter) = category.mime_filter() {
                query = query.with_mime(filter);
            }
            async move { self.file_repo.count(&query).await }
        };

        Ok(Stats {
            files: self.file_repo.count(&FileQuery::active(owner)).await?,
            folders: self.folder_repo.count_active(owner).await?,
            favorites: self.file_repo.count(&FileQuery::active(owner).favorites()).await?,
            images: count_category(FileCategory::Images).await?,
            videos: count_category(FileCategory::Videos).await?,
            documents: count_category(FileCategory::Documents).await?
                + count_category(FileCategory::Pdfs).await?,
            nested_folders: self.folder_repo.has_nested(owner).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    fn keys(catalog: &[Achievement], rows: &[UserAchievement]) -> Vec<String> {
        let mut keys: Vec<String> = rows
            .iter()
            .filter_map(|row| catalog.iter().find(|a| a.id == row.achievement_id))
            .map(|a| a.key.clone())
            .collect();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_unlock_is_idempotent() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        h.upload(&alice, "a.png", b"png", None).await;

        let first = h.achievements.check_and_unlock(&alice).await.unwrap();
        assert!(!first.is_empty());
        let second = h.achievements.check_and_unlock(&alice).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_thresholds() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let parent = h.folders.create_folder(&alice, "Parent", None).await.unwrap();
        h.folders.create_folder(&alice, "Child", Some(parent.id)).await.unwrap();
        let file = h.upload(&alice, "a.pdf", b"%PDF", None).await;
        h.files.toggle_favorite(&alice, file.id).await.unwrap();

        let overview = h.achievements.overview(&alice).await.unwrap();
        assert_eq!(
            keys(&overview.achievements, &overview.new_unlocked),
            vec!["early_adopter", "favorite_finder", "first_upload", "nested_genius", "organizer"]
        );
        assert_eq!(overview.user_achievements.len(), overview.new_unlocked.len());
        assert!(h.achievements.overview(&alice).await.unwrap().new_unlocked.is_empty());
    }
}
