//! Read models returned by the API. Field names match what the single-page
//! client binds to.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    db::{Join, Meetup, MeetupId, Profile, User, UserId},
    store::{ActivityTotals, JoinRow},
};

/// A meetup with its sponsor and every joiner named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetupView {
    pub meetup: Meetup,
    pub sponsor_user_name: String,
    pub sponsor_nick_name: Option<String>,
    pub join_views: Vec<JoinView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinView {
    pub join: Join,
    pub the_joined_user_nick_name: Option<String>,
}

impl From<JoinRow> for JoinView {
    fn from(row: JoinRow) -> Self {
        Self {
            join: row.join,
            the_joined_user_nick_name: row.nick_name,
        }
    }
}

/// The shape used by the main meetup feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetupViewModel {
    pub meetup: Meetup,
    pub sponsor_user_name: String,
    pub joins: Vec<NamedJoin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedJoin {
    pub user_id: UserId,
    pub meetup_id: MeetupId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user_name: String,
}

impl From<JoinRow> for NamedJoin {
    fn from(row: JoinRow) -> Self {
        Self {
            user_id: row.join.user_id,
            meetup_id: row.join.meetup_id,
            created_at: row.join.created_at,
            user_name: row.user_name,
        }
    }
}

/// A profile in a follow list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowProfileView {
    pub user_id: UserId,
    pub brief: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub gender: Option<String>,
    pub nick_name: Option<String>,
    pub picture: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub joined_meetups_total: i64,
    pub launched_meetups_total: i64,
}

impl FollowProfileView {
    pub fn new(profile: Profile, totals: ActivityTotals) -> Self {
        Self {
            user_id: profile.user_id,
            brief: profile.brief,
            created_at: profile.created_at,
            gender: profile.gender,
            nick_name: profile.nick_name,
            picture: profile.picture,
            updated_at: profile.updated_at,
            joined_meetups_total: totals.joined,
            launched_meetups_total: totals.launched,
        }
    }
}

/// Everything anyone may see about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserViewModel {
    pub user_id: UserId,
    pub email: String,
    pub user_name: String,
    pub number: Option<String>,
    pub nick_name: Option<String>,
    pub picture: Option<String>,
    pub gender: Option<String>,
    pub brief: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub joined_meetups_total: i64,
    pub launched_meetups_total: i64,
    pub recent_joined: Vec<Meetup>,
    pub recent_launched: Vec<Meetup>,
}

impl PublicUserViewModel {
    pub fn new(user: User, profile: &Profile, totals: ActivityTotals) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            user_name: user.user_name,
            number: user.number,
            nick_name: profile.nick_name.clone(),
            picture: profile.picture.clone(),
            gender: profile.gender.clone(),
            brief: profile.brief.clone(),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            joined_meetups_total: totals.joined,
            launched_meetups_total: totals.launched,
            recent_joined: Vec::new(),
            recent_launched: Vec::new(),
        }
    }
}

/// The public view plus the fields only the owner may read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateUserViewModel {
    #[serde(flatten)]
    pub public: PublicUserViewModel,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub login_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedUser {
    pub user_id: UserId,
    pub user_name: String,
}
