use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::db::{Follow, Join, Meetup, MeetupDraft, MeetupId, Profile, User, UserId};

use super::{
    ActivityTotals, FollowDirection, FollowStore, JoinRow, JoinStore, MeetupOrder, MeetupQuery,
    MeetupRow, MeetupScope, MeetupStore, UserStore,
};

/// Store kept entirely in process memory. Vectors keep insertion order.
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    profiles: Vec<Profile>,
    meetups: Vec<Meetup>,
    joins: Vec<Join>,
    follows: Vec<Follow>,
    last_meetup_id: MeetupId,
}

impl Tables {
    fn user_name(&self, user_id: &str) -> String {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.user_name.clone())
            .unwrap_or_default()
    }

    fn nick_name(&self, user_id: &str) -> Option<String> {
        self.profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .and_then(|p| p.nick_name.clone())
    }

    fn is_active(&self, meetup_id: MeetupId) -> bool {
        self.meetups
            .iter()
            .any(|m| m.id == meetup_id && !m.is_cancelled)
    }
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeetupStore for MemoryDb {
    async fn find_active_meetup(&self, id: MeetupId) -> anyhow::Result<Option<Meetup>> {
        let tables = self.tables.lock();
        Ok(tables
            .meetups
            .iter()
            .find(|m| m.id == id && !m.is_cancelled)
            .cloned())
    }

    async fn find_meetup_rows(&self, query: &MeetupQuery) -> anyhow::Result<Vec<MeetupRow>> {
        let tables = self.tables.lock();

        let mut meetups: Vec<&Meetup> = tables
            .meetups
            .iter()
            .filter(|m| !m.is_cancelled)
            .filter(|m| match &query.scope {
                MeetupScope::All => true,
                MeetupScope::JoinedBy(user_id) => tables
                    .joins
                    .iter()
                    .any(|j| j.meetup_id == m.id && &j.user_id == user_id),
                MeetupScope::LaunchedBy(user_id) => &m.sponsor == user_id,
            })
            .collect();

        if query.order == MeetupOrder::NewestFirst {
            meetups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        }

        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(meetups
            .into_iter()
            .skip(query.offset as usize)
            .take(limit)
            .map(|m| MeetupRow {
                meetup: m.clone(),
                sponsor_user_name: tables.user_name(&m.sponsor),
                sponsor_nick_name: tables.nick_name(&m.sponsor),
            })
            .collect())
    }

    async fn insert_meetup(&self, draft: MeetupDraft) -> anyhow::Result<Meetup> {
        let mut tables = self.tables.lock();
        tables.last_meetup_id += 1;

        let meetup = Meetup {
            id: tables.last_meetup_id,
            sponsor: draft.sponsor,
            title: draft.title,
            when: draft.when,
            place: draft.place,
            description: draft.description,
            is_cancelled: false,
            created_at: draft.created_at,
            updated_at: Some(draft.created_at),
            cancelled_at: None,
            version: 0,
        };
        tables.meetups.push(meetup.clone());
        Ok(meetup)
    }

    async fn update_meetup(&self, meetup: &Meetup, expected_version: i64) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock();
        let Some(stored) = tables
            .meetups
            .iter_mut()
            .find(|m| m.id == meetup.id && m.version == expected_version)
        else {
            return Ok(false);
        };

        // sponsor and created_at never change after creation
        *stored = Meetup {
            sponsor: stored.sponsor.clone(),
            created_at: stored.created_at,
            ..meetup.clone()
        };
        Ok(true)
    }
}

#[async_trait]
impl JoinStore for MemoryDb {
    async fn find_join_rows(&self, meetup_ids: &[MeetupId]) -> anyhow::Result<Vec<JoinRow>> {
        let tables = self.tables.lock();
        Ok(tables
            .joins
            .iter()
            .filter(|j| meetup_ids.contains(&j.meetup_id))
            .map(|j| JoinRow {
                join: j.clone(),
                user_name: tables.user_name(&j.user_id),
                nick_name: tables.nick_name(&j.user_id),
            })
            .collect())
    }

    async fn insert_join(&self, join: &Join) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock();
        if tables
            .joins
            .iter()
            .any(|j| j.user_id == join.user_id && j.meetup_id == join.meetup_id)
        {
            return Ok(false);
        }
        tables.joins.push(join.clone());
        Ok(true)
    }

    async fn delete_join(&self, user_id: &str, meetup_id: MeetupId) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock();
        let before = tables.joins.len();
        tables
            .joins
            .retain(|j| !(j.user_id == user_id && j.meetup_id == meetup_id));
        Ok(tables.joins.len() < before)
    }
}

#[async_trait]
impl FollowStore for MemoryDb {
    async fn find_follow_profiles(
        &self,
        user_id: &str,
        direction: FollowDirection,
    ) -> anyhow::Result<Vec<Profile>> {
        let tables = self.tables.lock();
        Ok(tables
            .follows
            .iter()
            .filter_map(|f| match direction {
                FollowDirection::Following if f.following_user_id == user_id => {
                    Some(&f.followed_user_id)
                }
                FollowDirection::FollowedBy if f.followed_user_id == user_id => {
                    Some(&f.following_user_id)
                }
                _ => None,
            })
            .filter_map(|other| tables.profiles.iter().find(|p| &p.user_id == other).cloned())
            .collect())
    }

    async fn insert_follow(&self, follow: &Follow) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock();
        if tables.follows.iter().any(|f| {
            f.following_user_id == follow.following_user_id
                && f.followed_user_id == follow.followed_user_id
        }) {
            return Ok(false);
        }
        tables.follows.push(follow.clone());
        Ok(true)
    }

    async fn delete_follow(&self, following: &str, followed: &str) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock();
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.following_user_id == following && f.followed_user_id == followed));
        Ok(tables.follows.len() < before)
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn find_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        let tables = self.tables.lock();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_profile(&self, user_id: &str) -> anyhow::Result<Option<Profile>> {
        let tables = self.tables.lock();
        Ok(tables.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn insert_user(&self, user: &User, profile: Option<&Profile>) -> anyhow::Result<()> {
        let mut tables = self.tables.lock();
        anyhow::ensure!(
            !tables.users.iter().any(|u| u.id == user.id),
            "user {} already exists",
            user.id
        );
        tables.users.push(user.clone());
        if let Some(profile) = profile {
            tables.profiles.push(profile.clone());
        }
        Ok(())
    }

    async fn update_profile(&self, profile: &Profile, expected_version: i64) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock();
        let Some(stored) = tables
            .profiles
            .iter_mut()
            .find(|p| p.user_id == profile.user_id && p.version == expected_version)
        else {
            return Ok(false);
        };

        *stored = Profile {
            login_count: stored.login_count,
            created_at: stored.created_at,
            ..profile.clone()
        };
        Ok(true)
    }

    async fn activity_totals(
        &self,
        user_ids: &[UserId],
    ) -> anyhow::Result<HashMap<UserId, ActivityTotals>> {
        let tables = self.tables.lock();
        Ok(user_ids
            .iter()
            .filter(|id| tables.users.iter().any(|u| &&u.id == id))
            .map(|id| {
                let joined = tables
                    .joins
                    .iter()
                    .filter(|j| &j.user_id == id && tables.is_active(j.meetup_id))
                    .count() as i64;
                let launched = tables
                    .meetups
                    .iter()
                    .filter(|m| &m.sponsor == id && !m.is_cancelled)
                    .count() as i64;
                (id.clone(), ActivityTotals { joined, launched })
            })
            .collect())
    }
}
