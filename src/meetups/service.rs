use std::{collections::HashMap, sync::Arc};

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use crate::{
    AppError, AppResult, access,
    db::{Join, MAX_TITLE_LEN, Meetup, MeetupDraft, MeetupId},
    session::Caller,
    store::{JoinRow, MeetupOrder, MeetupQuery, MeetupRow, MeetupScope, Store},
    views::{JoinView, MeetupView, MeetupViewModel, NamedJoin},
};

/// Body of `POST /api/Meetups`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeetup {
    pub sponsor: Option<String>,
    pub title: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub when: Option<OffsetDateTime>,
    #[serde(rename = "where")]
    pub place: Option<String>,
    pub description: Option<String>,
}

/// Body of `PUT /api/Meetups/{id}`. All four content fields are required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetupUpdate {
    pub id: Option<MeetupId>,
    pub title: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub when: Option<OffsetDateTime>,
    #[serde(rename = "where")]
    pub place: Option<String>,
    pub description: Option<String>,
    /// When given, the update only applies to this version of the meetup.
    pub version: Option<i64>,
}

#[derive(Clone)]
pub struct MeetupService {
    store: Arc<dyn Store>,
}

impl MeetupService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(name = "meetups.joined_by", skip(self))]
    pub async fn joined_by(&self, user_id: &str) -> AppResult<Vec<MeetupView>> {
        let query = MeetupQuery::new(MeetupScope::JoinedBy(user_id.to_owned()), MeetupOrder::Inserted);
        self.meetup_views(&query).await
    }

    #[instrument(name = "meetups.launched_by", skip(self))]
    pub async fn launched_by(&self, user_id: &str) -> AppResult<Vec<MeetupView>> {
        let query = MeetupQuery::new(MeetupScope::LaunchedBy(user_id.to_owned()), MeetupOrder::Inserted);
        self.meetup_views(&query).await
    }

    /// Newest first, optionally paged by `start` (offset) and `amount` (limit).
    #[instrument(name = "meetups.list", skip(self))]
    pub async fn list(&self, start: Option<u32>, amount: Option<u32>) -> AppResult<Vec<MeetupViewModel>> {
        let query = MeetupQuery::new(MeetupScope::All, MeetupOrder::NewestFirst)
            .page(start.unwrap_or(0), amount);
        let (rows, mut joins) = self.rows_with_joins(&query).await?;

        let models: Vec<_> = rows
            .into_iter()
            .map(|row| MeetupViewModel {
                joins: joins
                    .remove(&row.meetup.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(NamedJoin::from)
                    .collect(),
                sponsor_user_name: row.sponsor_user_name,
                meetup: row.meetup,
            })
            .collect();
        debug!(count = models.len(), "listed meetups");
        Ok(models)
    }

    #[instrument(name = "meetups.get", skip(self))]
    pub async fn get(&self, id: MeetupId) -> AppResult<Meetup> {
        self.store
            .find_active_meetup(id)
            .await?
            .ok_or(AppError::not_found("meetup"))
    }

    #[instrument(name = "meetups.create", skip(self, caller, input), fields(caller = caller.id()))]
    pub async fn create(&self, caller: &Caller, input: NewMeetup) -> AppResult<Meetup> {
        access::ensure_declared_sponsor(caller, input.sponsor.as_deref())?;

        let draft = MeetupDraft {
            sponsor: caller.id().to_owned(),
            title: validate_title(required("title", input.title)?)?,
            when: required("when", input.when)?,
            place: required("where", input.place)?,
            description: required("description", input.description)?,
            created_at: OffsetDateTime::now_utc(),
        };

        let meetup = self.store.insert_meetup(draft).await?;
        info!(meetup_id = meetup.id, "created meetup");
        Ok(meetup)
    }

    #[instrument(name = "meetups.update", skip(self, caller, patch), fields(caller = caller.id()))]
    pub async fn update(&self, caller: &Caller, id: MeetupId, patch: MeetupUpdate) -> AppResult<Meetup> {
        if patch.id.is_some_and(|body_id| body_id != id) {
            return Err(AppError::Malformed(format!("body id does not match meetup {id}")));
        }
        let (Some(title), Some(when), Some(place), Some(description)) =
            (patch.title, patch.when, patch.place, patch.description)
        else {
            return Err(AppError::Malformed(
                "title, when, where and description are all required".to_owned(),
            ));
        };
        let title = validate_title(title)?;

        let mut meetup = self.get(id).await?;
        access::ensure_sponsor(caller, &meetup)?;

        let expected_version = meetup.version;
        if patch.version.is_some_and(|v| v != expected_version) {
            return Err(AppError::Conflict(format!("meetup {id} was modified since it was read")));
        }

        meetup.title = title;
        meetup.when = when;
        meetup.place = place;
        meetup.description = description;
        meetup.updated_at = Some(OffsetDateTime::now_utc());
        meetup.version += 1;

        self.write(&meetup, expected_version).await?;
        info!(meetup_id = id, "updated meetup");
        Ok(meetup)
    }

    /// Soft delete: the row stays, flagged and timestamped.
    #[instrument(name = "meetups.cancel", skip(self, caller), fields(caller = caller.id()))]
    pub async fn cancel(&self, caller: &Caller, id: MeetupId) -> AppResult<Meetup> {
        let mut meetup = self.get(id).await?;
        access::ensure_sponsor(caller, &meetup)?;

        let expected_version = meetup.version;
        meetup.is_cancelled = true;
        meetup.cancelled_at = Some(OffsetDateTime::now_utc());
        meetup.version += 1;

        self.write(&meetup, expected_version).await?;
        info!(meetup_id = id, "cancelled meetup");
        Ok(meetup)
    }

    #[instrument(name = "meetups.joins", skip(self))]
    pub async fn joins(&self, meetup_id: MeetupId) -> AppResult<Vec<JoinView>> {
        self.get(meetup_id).await?;
        let rows = self.store.find_join_rows(&[meetup_id]).await?;
        Ok(rows.into_iter().map(JoinView::from).collect())
    }

    #[instrument(name = "meetups.join", skip(self, caller), fields(caller = caller.id()))]
    pub async fn join(&self, caller: &Caller, meetup_id: MeetupId) -> AppResult<Join> {
        self.get(meetup_id).await?;

        let join = Join {
            user_id: caller.id().to_owned(),
            meetup_id,
            created_at: OffsetDateTime::now_utc(),
        };
        if !self.store.insert_join(&join).await? {
            return Err(AppError::Conflict(format!("already joined meetup {meetup_id}")));
        }

        info!(meetup_id, "joined meetup");
        Ok(join)
    }

    #[instrument(name = "meetups.leave", skip(self, caller), fields(caller = caller.id()))]
    pub async fn leave(&self, caller: &Caller, meetup_id: MeetupId) -> AppResult<()> {
        if !self.store.delete_join(caller.id(), meetup_id).await? {
            return Err(AppError::not_found("join"));
        }
        info!(meetup_id, "left meetup");
        Ok(())
    }

    async fn meetup_views(&self, query: &MeetupQuery) -> AppResult<Vec<MeetupView>> {
        let (rows, mut joins) = self.rows_with_joins(query).await?;

        Ok(rows
            .into_iter()
            .map(|row| MeetupView {
                join_views: joins
                    .remove(&row.meetup.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(JoinView::from)
                    .collect(),
                sponsor_user_name: row.sponsor_user_name,
                sponsor_nick_name: row.sponsor_nick_name,
                meetup: row.meetup,
            })
            .collect())
    }

    /// Two round trips however many meetups match: one for the meetups, one
    /// for all of their joins.
    async fn rows_with_joins(
        &self,
        query: &MeetupQuery,
    ) -> AppResult<(Vec<MeetupRow>, HashMap<MeetupId, Vec<JoinRow>>)> {
        let rows = self.store.find_meetup_rows(query).await?;
        let ids: Vec<MeetupId> = rows.iter().map(|r| r.meetup.id).collect();

        let mut joins: HashMap<MeetupId, Vec<JoinRow>> = HashMap::new();
        for row in self.store.find_join_rows(&ids).await? {
            joins.entry(row.join.meetup_id).or_default().push(row);
        }
        Ok((rows, joins))
    }

    async fn write(&self, meetup: &Meetup, expected_version: i64) -> AppResult<()> {
        if self.store.update_meetup(meetup, expected_version).await? {
            Ok(())
        } else {
            Err(AppError::Conflict(format!(
                "meetup {} was modified concurrently",
                meetup.id
            )))
        }
    }
}

fn required<T>(field: &'static str, value: Option<T>) -> AppResult<T> {
    value.ok_or_else(|| AppError::validation(field, "is required"))
}

fn validate_title(title: String) -> AppResult<String> {
    if title.trim().is_empty() {
        return Err(AppError::validation("title", "must not be empty"));
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(AppError::validation(
            "title",
            format!("is {len} characters long, at most {MAX_TITLE_LEN} allowed"),
        ));
    }
    Ok(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_length_counts_characters() {
        assert!(validate_title("é".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(matches!(
            validate_title("a".repeat(MAX_TITLE_LEN + 1)),
            Err(AppError::Validation { field: "title", .. })
        ));
        assert!(validate_title("   ".to_owned()).is_err());
    }

    #[test]
    fn missing_field_names_the_field() {
        match required::<String>("where", None) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "where"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
