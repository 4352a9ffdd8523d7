use std::collections::HashMap;

use async_trait::async_trait;
use meetu::{
    db::{Follow, Join, Meetup, MeetupDraft, MeetupId, Profile, User, UserId},
    store::{
        ActivityTotals, FollowDirection, FollowStore, JoinRow, JoinStore, MeetupQuery, MeetupRow,
        MeetupStore, MemoryDb, UserStore,
    },
};

pub const RIVAL_EDIT: &str = "rival edit";

/// A `MemoryDb` where another writer always lands between a service's read
/// and its versioned write.
#[derive(Default)]
pub struct RacingStore {
    inner: MemoryDb,
}

#[async_trait]
impl MeetupStore for RacingStore {
    async fn find_active_meetup(&self, id: MeetupId) -> anyhow::Result<Option<Meetup>> {
        self.inner.find_active_meetup(id).await
    }

    async fn find_meetup_rows(&self, query: &MeetupQuery) -> anyhow::Result<Vec<MeetupRow>> {
        self.inner.find_meetup_rows(query).await
    }

    async fn insert_meetup(&self, draft: MeetupDraft) -> anyhow::Result<Meetup> {
        self.inner.insert_meetup(draft).await
    }

    async fn update_meetup(&self, meetup: &Meetup, expected_version: i64) -> anyhow::Result<bool> {
        if let Some(current) = self.inner.find_active_meetup(meetup.id).await? {
            let rival = Meetup {
                title: RIVAL_EDIT.to_owned(),
                version: current.version + 1,
                ..current.clone()
            };
            self.inner.update_meetup(&rival, current.version).await?;
        }
        self.inner.update_meetup(meetup, expected_version).await
    }
}

#[async_trait]
impl JoinStore for RacingStore {
    async fn find_join_rows(&self, meetup_ids: &[MeetupId]) -> anyhow::Result<Vec<JoinRow>> {
        self.inner.find_join_rows(meetup_ids).await
    }

    async fn insert_join(&self, join: &Join) -> anyhow::Result<bool> {
        self.inner.insert_join(join).await
    }

    async fn delete_join(&self, user_id: &str, meetup_id: MeetupId) -> anyhow::Result<bool> {
        self.inner.delete_join(user_id, meetup_id).await
    }
}

#[async_trait]
impl FollowStore for RacingStore {
    async fn find_follow_profiles(
        &self,
        user_id: &str,
        direction: FollowDirection,
    ) -> anyhow::Result<Vec<Profile>> {
        self.inner.find_follow_profiles(user_id, direction).await
    }

    async fn insert_follow(&self, follow: &Follow) -> anyhow::Result<bool> {
        self.inner.insert_follow(follow).await
    }

    async fn delete_follow(&self, following: &str, followed: &str) -> anyhow::Result<bool> {
        self.inner.delete_follow(following, followed).await
    }
}

#[async_trait]
impl UserStore for RacingStore {
    async fn find_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn find_profile(&self, user_id: &str) -> anyhow::Result<Option<Profile>> {
        self.inner.find_profile(user_id).await
    }

    async fn insert_user(&self, user: &User, profile: Option<&Profile>) -> anyhow::Result<()> {
        self.inner.insert_user(user, profile).await
    }

    async fn update_profile(&self, profile: &Profile, expected_version: i64) -> anyhow::Result<bool> {
        if let Some(current) = self.inner.find_profile(&profile.user_id).await? {
            let rival = Profile {
                nick_name: Some(RIVAL_EDIT.to_owned()),
                version: current.version + 1,
                ..current.clone()
            };
            self.inner.update_profile(&rival, current.version).await?;
        }
        self.inner.update_profile(profile, expected_version).await
    }

    async fn activity_totals(
        &self,
        user_ids: &[UserId],
    ) -> anyhow::Result<HashMap<UserId, ActivityTotals>> {
        self.inner.activity_totals(user_ids).await
    }
}
