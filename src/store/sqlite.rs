use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::{Follow, Join, Meetup, MeetupDraft, MeetupId, Profile, User, UserId};

use super::{
    ActivityTotals, FollowDirection, FollowStore, JoinRow, JoinStore, MeetupOrder, MeetupQuery,
    MeetupRow, MeetupScope, MeetupStore, UserStore,
};

const MEETUP_COLUMNS: &str = "m.id, m.sponsor, m.title, m.held_at, m.place, m.description, \
    m.is_cancelled, m.created_at, m.updated_at, m.cancelled_at, m.version";

const PROFILE_COLUMNS: &str = "p.user_id, p.nick_name, p.given_name, p.family_name, p.gender, \
    p.brief, p.picture, p.login_count, p.created_at, p.updated_at, p.version";

#[derive(Clone)]
pub struct SqliteStore {
    db_pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MeetupStore for SqliteStore {
    async fn find_active_meetup(&self, id: MeetupId) -> anyhow::Result<Option<Meetup>> {
        let meetup = sqlx::query_as(&format!(
            "SELECT {MEETUP_COLUMNS} FROM meetups m WHERE m.id=? AND m.is_cancelled=0"
        ))
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .context("find_active_meetup failed")?;
        Ok(meetup)
    }

    async fn find_meetup_rows(&self, query: &MeetupQuery) -> anyhow::Result<Vec<MeetupRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {MEETUP_COLUMNS}, u.user_name AS sponsor_user_name, p.nick_name AS sponsor_nick_name \
             FROM meetups m \
             JOIN users u ON u.id = m.sponsor \
             LEFT JOIN profiles p ON p.user_id = m.sponsor \
             WHERE m.is_cancelled=0"
        ));

        match &query.scope {
            MeetupScope::All => {}
            MeetupScope::JoinedBy(user_id) => {
                qb.push(" AND EXISTS (SELECT 1 FROM joins j WHERE j.meetup_id = m.id AND j.user_id = ")
                    .push_bind(user_id.clone())
                    .push(")");
            }
            MeetupScope::LaunchedBy(user_id) => {
                qb.push(" AND m.sponsor = ").push_bind(user_id.clone());
            }
        }

        qb.push(match query.order {
            MeetupOrder::Inserted => " ORDER BY m.id",
            MeetupOrder::NewestFirst => " ORDER BY m.created_at DESC, m.id DESC",
        });

        // sqlite only accepts OFFSET after a LIMIT; -1 means unbounded
        qb.push(" LIMIT ")
            .push_bind(query.limit.map(i64::from).unwrap_or(-1))
            .push(" OFFSET ")
            .push_bind(i64::from(query.offset));

        let rows = qb
            .build_query_as::<MeetupRow>()
            .fetch_all(&self.db_pool)
            .await
            .context("find_meetup_rows failed")?;
        Ok(rows)
    }

    async fn insert_meetup(&self, draft: MeetupDraft) -> anyhow::Result<Meetup> {
        let id = sqlx::query(
            "INSERT INTO meetups (sponsor,title,held_at,place,description,is_cancelled,created_at,updated_at,version) \
             VALUES (?,?,?,?,?,0,?,?,0)",
        )
        .bind(&draft.sponsor)
        .bind(&draft.title)
        .bind(draft.when)
        .bind(&draft.place)
        .bind(&draft.description)
        .bind(draft.created_at)
        .bind(draft.created_at)
        .execute(&self.db_pool)
        .await
        .context("insert_meetup failed")?
        .last_insert_rowid();

        Ok(Meetup {
            id,
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
        })
    }

    async fn update_meetup(&self, meetup: &Meetup, expected_version: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE meetups SET title=?, held_at=?, place=?, description=?, is_cancelled=?, \
             updated_at=?, cancelled_at=?, version=? WHERE id=? AND version=?",
        )
        .bind(&meetup.title)
        .bind(meetup.when)
        .bind(&meetup.place)
        .bind(&meetup.description)
        .bind(meetup.is_cancelled)
        .bind(meetup.updated_at)
        .bind(meetup.cancelled_at)
        .bind(meetup.version)
        .bind(meetup.id)
        .bind(expected_version)
        .execute(&self.db_pool)
        .await
        .context("update_meetup failed")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl JoinStore for SqliteStore {
    async fn find_join_rows(&self, meetup_ids: &[MeetupId]) -> anyhow::Result<Vec<JoinRow>> {
        if meetup_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT j.user_id, j.meetup_id, j.created_at, u.user_name, p.nick_name \
             FROM joins j \
             JOIN users u ON u.id = j.user_id \
             LEFT JOIN profiles p ON p.user_id = j.user_id \
             WHERE j.meetup_id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in meetup_ids {
            ids.push_bind(*id);
        }
        qb.push(") ORDER BY j.rowid");

        let rows = qb
            .build_query_as::<JoinRow>()
            .fetch_all(&self.db_pool)
            .await
            .context("find_join_rows failed")?;
        Ok(rows)
    }

    async fn insert_join(&self, join: &Join) -> anyhow::Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO joins (user_id,meetup_id,created_at) VALUES (?,?,?)")
            .bind(&join.user_id)
            .bind(join.meetup_id)
            .bind(join.created_at)
            .execute(&self.db_pool)
            .await
            .context("insert_join failed")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_join(&self, user_id: &str, meetup_id: MeetupId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM joins WHERE user_id=? AND meetup_id=?")
            .bind(user_id)
            .bind(meetup_id)
            .execute(&self.db_pool)
            .await
            .context("delete_join failed")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl FollowStore for SqliteStore {
    async fn find_follow_profiles(
        &self,
        user_id: &str,
        direction: FollowDirection,
    ) -> anyhow::Result<Vec<Profile>> {
        let (profile_side, filter_side) = match direction {
            FollowDirection::Following => ("followed_user_id", "following_user_id"),
            FollowDirection::FollowedBy => ("following_user_id", "followed_user_id"),
        };

        let profiles = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM follows f \
             JOIN profiles p ON p.user_id = f.{profile_side} \
             WHERE f.{filter_side}=? ORDER BY f.rowid"
        ))
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await
        .context("find_follow_profiles failed")?;
        Ok(profiles)
    }

    async fn insert_follow(&self, follow: &Follow) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (following_user_id,followed_user_id,created_at) VALUES (?,?,?)",
        )
        .bind(&follow.following_user_id)
        .bind(&follow.followed_user_id)
        .bind(follow.created_at)
        .execute(&self.db_pool)
        .await
        .context("insert_follow failed")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, following: &str, followed: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE following_user_id=? AND followed_user_id=?")
            .bind(following)
            .bind(followed)
            .execute(&self.db_pool)
            .await
            .context("delete_follow failed")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn find_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as("SELECT id,email,user_name,number FROM users WHERE id=?")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
            .context("find_user failed")?;
        Ok(user)
    }

    async fn find_profile(&self, user_id: &str) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.user_id=?"))
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("find_profile failed")?;
        Ok(profile)
    }

    async fn insert_user(&self, user: &User, profile: Option<&Profile>) -> anyhow::Result<()> {
        let mut tx = self.db_pool.begin().await.context("insert_user: begin failed")?;

        sqlx::query("INSERT INTO users (id,email,user_name,number) VALUES (?,?,?,?)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.user_name)
            .bind(&user.number)
            .execute(&mut *tx)
            .await
            .context("insert_user failed")?;

        if let Some(p) = profile {
            sqlx::query(
                "INSERT INTO profiles (user_id,nick_name,given_name,family_name,gender,brief,picture,\
                 login_count,created_at,updated_at,version) VALUES (?,?,?,?,?,?,?,?,?,?,?)",
            )
            .bind(&p.user_id)
            .bind(&p.nick_name)
            .bind(&p.given_name)
            .bind(&p.family_name)
            .bind(&p.gender)
            .bind(&p.brief)
            .bind(&p.picture)
            .bind(p.login_count)
            .bind(p.created_at)
            .bind(p.updated_at)
            .bind(p.version)
            .execute(&mut *tx)
            .await
            .context("insert_user: profile insert failed")?;
        }

        tx.commit().await.context("insert_user: commit failed")?;
        Ok(())
    }

    async fn update_profile(&self, profile: &Profile, expected_version: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE profiles SET nick_name=?, given_name=?, family_name=?, gender=?, brief=?, picture=?, \
             updated_at=?, version=? WHERE user_id=? AND version=?",
        )
        .bind(&profile.nick_name)
        .bind(&profile.given_name)
        .bind(&profile.family_name)
        .bind(&profile.gender)
        .bind(&profile.brief)
        .bind(&profile.picture)
        .bind(profile.updated_at)
        .bind(profile.version)
        .bind(&profile.user_id)
        .bind(expected_version)
        .execute(&self.db_pool)
        .await
        .context("update_profile failed")?;
        Ok(result.rows_affected() > 0)
    }

    async fn activity_totals(
        &self,
        user_ids: &[UserId],
    ) -> anyhow::Result<HashMap<UserId, ActivityTotals>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT u.id, \
             (SELECT COUNT(*) FROM joins j JOIN meetups m ON m.id = j.meetup_id \
              WHERE j.user_id = u.id AND m.is_cancelled=0), \
             (SELECT COUNT(*) FROM meetups m WHERE m.sponsor = u.id AND m.is_cancelled=0) \
             FROM users u WHERE u.id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in user_ids {
            ids.push_bind(id.clone());
        }
        qb.push(")");

        let rows: Vec<(String, i64, i64)> = qb
            .build_query_as()
            .fetch_all(&self.db_pool)
            .await
            .context("activity_totals failed")?;

        Ok(rows
            .into_iter()
            .map(|(id, joined, launched)| (id, ActivityTotals { joined, launched }))
            .collect())
    }
}
