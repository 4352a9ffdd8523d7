//! Data access ports.
//!
//! One trait per table group; services only ever see `dyn Store`. Rows that
//! feed view models come back pre-joined so a listing costs a fixed number of
//! queries regardless of how many meetups or joiners it holds.

mod memory;
mod sqlite;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::db::{Follow, Join, Meetup, MeetupDraft, MeetupId, Profile, User, UserId};

pub use memory::MemoryDb;
pub use sqlite::SqliteStore;

/// Which meetups a listing covers. Cancelled meetups are never included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetupScope {
    All,
    JoinedBy(UserId),
    LaunchedBy(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetupOrder {
    /// Ascending id, i.e. the order the rows were written.
    Inserted,
    /// Descending `created_at`, ties broken by descending id.
    NewestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetupQuery {
    pub scope: MeetupScope,
    pub order: MeetupOrder,
    pub offset: u32,
    pub limit: Option<u32>,
}

impl MeetupQuery {
    pub fn new(scope: MeetupScope, order: MeetupOrder) -> Self {
        Self {
            scope,
            order,
            offset: 0,
            limit: None,
        }
    }

    pub fn page(mut self, offset: u32, limit: Option<u32>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// A meetup joined with its sponsor's user and profile rows.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MeetupRow {
    #[sqlx(flatten)]
    pub meetup: Meetup,
    pub sponsor_user_name: String,
    pub sponsor_nick_name: Option<String>,
}

/// A join joined with the joining user's user and profile rows.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct JoinRow {
    #[sqlx(flatten)]
    pub join: Join,
    pub user_name: String,
    pub nick_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDirection {
    /// Users the given user follows.
    Following,
    /// Users following the given user.
    FollowedBy,
}

/// Per-user counts over non-cancelled meetups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityTotals {
    pub joined: i64,
    pub launched: i64,
}

#[async_trait]
pub trait MeetupStore: Send + Sync {
    /// Load a meetup by id unless it is cancelled.
    async fn find_active_meetup(&self, id: MeetupId) -> anyhow::Result<Option<Meetup>>;
    async fn find_meetup_rows(&self, query: &MeetupQuery) -> anyhow::Result<Vec<MeetupRow>>;
    /// Persist a draft and return it with its assigned id.
    async fn insert_meetup(&self, draft: MeetupDraft) -> anyhow::Result<Meetup>;
    /// Overwrite the stored meetup if its version still equals `expected_version`.
    ///
    /// Returns false when another writer got there first.
    async fn update_meetup(&self, meetup: &Meetup, expected_version: i64) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait JoinStore: Send + Sync {
    /// Joins for the given meetups, in insertion order.
    async fn find_join_rows(&self, meetup_ids: &[MeetupId]) -> anyhow::Result<Vec<JoinRow>>;
    /// Returns false if the pair already exists.
    async fn insert_join(&self, join: &Join) -> anyhow::Result<bool>;
    /// Returns false if there was nothing to delete.
    async fn delete_join(&self, user_id: &str, meetup_id: MeetupId) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait FollowStore: Send + Sync {
    async fn find_follow_profiles(
        &self,
        user_id: &str,
        direction: FollowDirection,
    ) -> anyhow::Result<Vec<Profile>>;
    /// Returns false if the edge already exists.
    async fn insert_follow(&self, follow: &Follow) -> anyhow::Result<bool>;
    async fn delete_follow(&self, following: &str, followed: &str) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &str) -> anyhow::Result<Option<User>>;
    async fn find_profile(&self, user_id: &str) -> anyhow::Result<Option<Profile>>;
    /// Registration writes both rows together; used by seeding and tests.
    async fn insert_user(&self, user: &User, profile: Option<&Profile>) -> anyhow::Result<()>;
    /// Same contract as [`MeetupStore::update_meetup`].
    async fn update_profile(&self, profile: &Profile, expected_version: i64) -> anyhow::Result<bool>;
    async fn activity_totals(
        &self,
        user_ids: &[UserId],
    ) -> anyhow::Result<HashMap<UserId, ActivityTotals>>;
}

pub trait Store: MeetupStore + JoinStore + FollowStore + UserStore {}

impl<T> Store for T where T: MeetupStore + JoinStore + FollowStore + UserStore {}
