#![allow(dead_code)]

pub mod racing;

use std::sync::Arc;

use meetu::{
    db::{Profile, User},
    meetups::NewMeetup,
    store::{MemoryDb, SqliteStore, Store, UserStore},
};
use sqlx::sqlite::SqlitePoolOptions;
use time::{OffsetDateTime, macros::datetime};

pub const WHEN: OffsetDateTime = datetime!(2026-11-01 10:00 UTC);

pub fn user(id: &str) -> User {
    User {
        id: id.to_owned(),
        email: format!("{id}@example.com"),
        user_name: format!("{id}_name"),
        number: Some("555-0100".to_owned()),
    }
}

pub fn profile(id: &str) -> Profile {
    Profile {
        nick_name: Some(format!("{id} nick")),
        given_name: Some("Given".to_owned()),
        family_name: Some("Family".to_owned()),
        gender: Some("female".to_owned()),
        brief: Some("hello".to_owned()),
        login_count: 3,
        ..Profile::new(id, datetime!(2026-01-01 0:00 UTC))
    }
}

pub async fn seed(store: &dyn Store, ids: &[&str]) {
    for id in ids {
        store.insert_user(&user(id), Some(&profile(id))).await.unwrap();
    }
}

/// Store where every versioned update loses to a concurrent writer.
pub async fn racing_store(ids: &[&str]) -> Arc<dyn Store> {
    let store: Arc<dyn Store> = Arc::new(racing::RacingStore::default());
    seed(&*store, ids).await;
    store
}

pub async fn memory_store(ids: &[&str]) -> Arc<dyn Store> {
    let store: Arc<dyn Store> = Arc::new(MemoryDb::new());
    seed(&*store, ids).await;
    store
}

/// A single connection so every query sees the same in-memory database.
pub async fn sqlite_store(ids: &[&str]) -> Arc<dyn Store> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&db_pool).await.unwrap();

    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(db_pool));
    seed(&*store, ids).await;
    store
}

pub fn coffee(sponsor: &str) -> NewMeetup {
    NewMeetup {
        sponsor: Some(sponsor.to_owned()),
        title: Some("Coffee".to_owned()),
        when: Some(WHEN),
        place: Some("Cafe X".to_owned()),
        description: Some("chat".to_owned()),
    }
}

pub fn titled(sponsor: &str, title: &str) -> NewMeetup {
    NewMeetup {
        title: Some(title.to_owned()),
        ..coffee(sponsor)
    }
}
