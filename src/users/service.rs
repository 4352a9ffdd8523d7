use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use crate::{
    AppError, AppResult, access,
    db::{Follow, Meetup, Profile, User, UserId},
    session::Caller,
    store::{FollowDirection, MeetupOrder, MeetupQuery, MeetupScope, Store},
    views::{FollowProfileView, LoggedUser, PrivateUserViewModel, PublicUserViewModel},
};

/// How many recent meetups a profile view should carry alongside its totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preview {
    pub joined: Option<u32>,
    pub launched: Option<u32>,
}

/// Body of `PUT /api/Users/Private`. Every editable field is overwritten,
/// including with nulls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub user_id: UserId,
    pub gender: Option<String>,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub nick_name: Option<String>,
    pub picture: Option<String>,
    pub brief: Option<String>,
    pub version: Option<i64>,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Profiles of the users `user_id` follows.
    #[instrument(name = "users.following", skip(self))]
    pub async fn following(&self, user_id: &str) -> AppResult<Vec<FollowProfileView>> {
        self.follow_views(user_id, FollowDirection::Following).await
    }

    /// Profiles of the users following `user_id`.
    #[instrument(name = "users.followed_by", skip(self))]
    pub async fn followed_by(&self, user_id: &str) -> AppResult<Vec<FollowProfileView>> {
        self.follow_views(user_id, FollowDirection::FollowedBy).await
    }

    #[instrument(name = "users.public_profile", skip(self))]
    pub async fn public_profile(&self, user_id: &str, preview: Preview) -> AppResult<PublicUserViewModel> {
        let (user, profile) = self.load(user_id).await?;
        self.public_view(user, &profile, preview).await
    }

    #[instrument(name = "users.private_profile", skip(self, caller), fields(caller = caller.id()))]
    pub async fn private_profile(
        &self,
        caller: &Caller,
        user_id: &str,
        preview: Preview,
    ) -> AppResult<PrivateUserViewModel> {
        access::ensure_self(caller, user_id)?;

        let (user, profile) = self.load(user_id).await?;
        let public = self.public_view(user, &profile, preview).await?;
        Ok(PrivateUserViewModel {
            public,
            family_name: profile.family_name,
            given_name: profile.given_name,
            login_count: profile.login_count,
        })
    }

    #[instrument(name = "users.update_private_profile", skip(self, caller, input), fields(caller = caller.id()))]
    pub async fn update_private_profile(&self, caller: &Caller, input: ProfileUpdate) -> AppResult<()> {
        access::ensure_self(caller, &input.user_id)?;

        let mut profile = self
            .store
            .find_profile(&input.user_id)
            .await?
            .ok_or(AppError::not_found("profile"))?;

        let expected_version = profile.version;
        if input.version.is_some_and(|v| v != expected_version) {
            return Err(AppError::Conflict("profile was modified since it was read".to_owned()));
        }

        profile.gender = input.gender;
        profile.family_name = input.family_name;
        profile.given_name = input.given_name;
        profile.nick_name = input.nick_name;
        profile.picture = input.picture;
        profile.brief = input.brief;
        profile.updated_at = Some(OffsetDateTime::now_utc());
        profile.version += 1;

        if !self.store.update_profile(&profile, expected_version).await? {
            return Err(AppError::Conflict("profile was modified concurrently".to_owned()));
        }
        info!("updated profile");
        Ok(())
    }

    #[instrument(name = "users.logged_user", skip(self, caller), fields(caller = caller.id()))]
    pub async fn logged_user(&self, caller: &Caller) -> AppResult<LoggedUser> {
        let user = self
            .store
            .find_user(caller.id())
            .await?
            .ok_or(AppError::not_found("user"))?;
        Ok(LoggedUser {
            user_id: user.id,
            user_name: user.user_name,
        })
    }

    #[instrument(name = "users.follow", skip(self, caller), fields(caller = caller.id()))]
    pub async fn follow(&self, caller: &Caller, followed_user_id: &str) -> AppResult<Follow> {
        if caller.is(followed_user_id) {
            return Err(AppError::validation("followedUserId", "cannot follow yourself"));
        }
        if self.store.find_user(followed_user_id).await?.is_none() {
            return Err(AppError::not_found("user"));
        }

        let follow = Follow {
            following_user_id: caller.id().to_owned(),
            followed_user_id: followed_user_id.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        if !self.store.insert_follow(&follow).await? {
            return Err(AppError::Conflict(format!("already following {followed_user_id}")));
        }

        info!(followed_user_id, "followed user");
        Ok(follow)
    }

    #[instrument(name = "users.unfollow", skip(self, caller), fields(caller = caller.id()))]
    pub async fn unfollow(&self, caller: &Caller, followed_user_id: &str) -> AppResult<()> {
        if !self.store.delete_follow(caller.id(), followed_user_id).await? {
            return Err(AppError::not_found("follow"));
        }
        info!(followed_user_id, "unfollowed user");
        Ok(())
    }

    /// Both rows or neither; exactly one means the tables have drifted apart.
    async fn load(&self, user_id: &str) -> AppResult<(User, Profile)> {
        let user = self.store.find_user(user_id).await?;
        let profile = self.store.find_profile(user_id).await?;

        match (user, profile) {
            (Some(user), Some(profile)) => Ok((user, profile)),
            (None, None) => Err(AppError::not_found("user")),
            _ => Err(AppError::Inconsistent {
                user_id: user_id.to_owned(),
            }),
        }
    }

    async fn public_view(&self, user: User, profile: &Profile, preview: Preview) -> AppResult<PublicUserViewModel> {
        let totals = self
            .store
            .activity_totals(std::slice::from_ref(&user.id))
            .await?
            .remove(&user.id)
            .unwrap_or_default();

        let recent_joined = self
            .recent(MeetupScope::JoinedBy(user.id.clone()), preview.joined)
            .await?;
        let recent_launched = self
            .recent(MeetupScope::LaunchedBy(user.id.clone()), preview.launched)
            .await?;

        Ok(PublicUserViewModel {
            recent_joined,
            recent_launched,
            ..PublicUserViewModel::new(user, profile, totals)
        })
    }

    async fn recent(&self, scope: MeetupScope, amount: Option<u32>) -> AppResult<Vec<Meetup>> {
        let Some(amount) = amount.filter(|&a| a > 0) else {
            return Ok(Vec::new());
        };
        let query = MeetupQuery::new(scope, MeetupOrder::NewestFirst).page(0, Some(amount));
        let rows = self.store.find_meetup_rows(&query).await?;
        Ok(rows.into_iter().map(|r| r.meetup).collect())
    }

    async fn follow_views(&self, user_id: &str, direction: FollowDirection) -> AppResult<Vec<FollowProfileView>> {
        let profiles = self.store.find_follow_profiles(user_id, direction).await?;
        let ids: Vec<UserId> = profiles.iter().map(|p| p.user_id.clone()).collect();
        let mut totals = self.store.activity_totals(&ids).await?;

        let views: Vec<_> = profiles
            .into_iter()
            .map(|p| {
                let t = totals.remove(&p.user_id).unwrap_or_default();
                FollowProfileView::new(p, t)
            })
            .collect();
        debug!(count = views.len(), ?direction, "listed follow profiles");
        Ok(views)
    }
}
