use serde::Serialize;
use time::OffsetDateTime;

pub type UserId = String;
pub type MeetupId = i64;

pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub user_name: String,
    /// Phone number.
    pub number: Option<String>,

    // unique: id
    // unique: user_name
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Profile {
    pub user_id: UserId,

    pub nick_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub gender: Option<String>,
    pub brief: Option<String>,
    pub picture: Option<String>,
    pub login_count: i64,

    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub version: i64,

    // unique: user_id
}

impl Profile {
    /// Blank profile as written at registration.
    pub fn new(user_id: impl Into<UserId>, created_at: OffsetDateTime) -> Self {
        Self {
            user_id: user_id.into(),
            nick_name: None,
            given_name: None,
            family_name: None,
            gender: None,
            brief: None,
            picture: None,
            login_count: 0,
            created_at,
            updated_at: None,
            version: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Meetup {
    pub id: MeetupId,
    pub sponsor: UserId,

    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    #[sqlx(rename = "held_at")]
    pub when: OffsetDateTime,
    #[serde(rename = "where")]
    pub place: String,
    pub description: String,

    pub is_cancelled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
    pub version: i64,

    // unique: id
}

/// A validated meetup that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct MeetupDraft {
    pub sponsor: UserId,
    pub title: String,
    pub when: OffsetDateTime,
    pub place: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Join {
    pub user_id: UserId,
    pub meetup_id: MeetupId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    // unique: user_id, meetup_id
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub following_user_id: UserId,
    pub followed_user_id: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    // unique: following_user_id, followed_user_id
    // check: following_user_id != followed_user_id
}
