mod common;

use common::{coffee, memory_store, racing::RIVAL_EDIT, racing_store, titled, user};
use meetu::{
    AppError, MeetupService, UserService,
    session::Caller,
    store::UserStore,
    users::{Preview, ProfileUpdate},
};

async fn services(ids: &[&str]) -> (MeetupService, UserService) {
    let store = memory_store(ids).await;
    (MeetupService::new(store.clone()), UserService::new(store))
}

#[tokio::test]
async fn public_profile_merges_user_profile_and_totals() {
    let (meetups, users) = services(&["alice", "bob"]).await;
    let alice = Caller::new("alice");
    let bob = Caller::new("bob");

    let a1 = meetups.create(&alice, titled("alice", "a1")).await.unwrap();
    let a2 = meetups.create(&alice, titled("alice", "a2")).await.unwrap();
    let b1 = meetups.create(&bob, titled("bob", "b1")).await.unwrap();
    meetups.join(&alice, b1.id).await.unwrap();
    meetups.join(&bob, a1.id).await.unwrap();
    meetups.join(&bob, a2.id).await.unwrap();
    meetups.cancel(&alice, a2.id).await.unwrap();

    let view = users.public_profile("alice", Preview::default()).await.unwrap();
    assert_eq!(view.user_id, "alice");
    assert_eq!(view.user_name, "alice_name");
    assert_eq!(view.email, "alice@example.com");
    assert_eq!(view.nick_name.as_deref(), Some("alice nick"));
    assert_eq!(view.launched_meetups_total, 1);
    assert_eq!(view.joined_meetups_total, 1);
    assert!(view.recent_joined.is_empty());
    assert!(view.recent_launched.is_empty());

    let bob_view = users.public_profile("bob", Preview::default()).await.unwrap();
    assert_eq!(bob_view.joined_meetups_total, 1);
    assert_eq!(bob_view.launched_meetups_total, 1);
}

#[tokio::test]
async fn public_view_hides_private_fields() {
    let (_, users) = services(&["alice"]).await;
    let view = users.public_profile("alice", Preview::default()).await.unwrap();

    let json = serde_json::to_value(&view).unwrap();
    assert!(json.get("familyName").is_none());
    assert!(json.get("givenName").is_none());
    assert!(json.get("loginCount").is_none());
    assert_eq!(json["userName"], "alice_name");
    assert_eq!(json["joinedMeetupsTotal"], 0);
}

#[tokio::test]
async fn previews_are_newest_first_and_capped() {
    let (meetups, users) = services(&["alice", "bob"]).await;
    let alice = Caller::new("alice");
    for title in ["one", "two", "three"] {
        let m = meetups.create(&alice, titled("alice", title)).await.unwrap();
        meetups.join(&Caller::new("bob"), m.id).await.unwrap();
    }

    let view = users
        .public_profile(
            "alice",
            Preview {
                joined: Some(3),
                launched: Some(2),
            },
        )
        .await
        .unwrap();
    let launched: Vec<_> = view.recent_launched.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(launched, ["three", "two"]);
    assert!(view.recent_joined.is_empty());

    let bob = users
        .public_profile(
            "bob",
            Preview {
                joined: Some(1),
                launched: Some(0),
            },
        )
        .await
        .unwrap();
    assert_eq!(bob.recent_joined.len(), 1);
    assert_eq!(bob.recent_joined[0].title, "three");
    assert!(bob.recent_launched.is_empty());
}

#[tokio::test]
async fn missing_user_is_not_found_half_missing_is_inconsistent() {
    let store = memory_store(&["alice"]).await;
    store.insert_user(&user("orphan"), None).await.unwrap();
    let users = UserService::new(store);

    assert!(matches!(
        users.public_profile("nobody", Preview::default()).await,
        Err(AppError::NotFound { what: "user" })
    ));
    assert!(matches!(
        users.public_profile("orphan", Preview::default()).await,
        Err(AppError::Inconsistent { user_id }) if user_id == "orphan"
    ));
    assert!(matches!(
        users
            .private_profile(&Caller::new("orphan"), "orphan", Preview::default())
            .await,
        Err(AppError::Inconsistent { .. })
    ));
}

#[tokio::test]
async fn private_profile_is_self_only_regardless_of_existence() {
    let (_, users) = services(&["alice", "bob"]).await;
    let bob = Caller::new("bob");

    for target in ["alice", "nobody"] {
        assert!(matches!(
            users.private_profile(&bob, target, Preview::default()).await,
            Err(AppError::Forbidden)
        ));
    }

    let own = users
        .private_profile(&Caller::new("alice"), "alice", Preview::default())
        .await
        .unwrap();
    assert_eq!(own.family_name.as_deref(), Some("Family"));
    assert_eq!(own.given_name.as_deref(), Some("Given"));
    assert_eq!(own.login_count, 3);
    assert_eq!(own.public.user_name, "alice_name");

    let json = serde_json::to_value(&own).unwrap();
    assert_eq!(json["familyName"], "Family");
    assert_eq!(json["userId"], "alice");
}

#[tokio::test]
async fn profile_update_overwrites_owned_fields() {
    let (_, users) = services(&["alice"]).await;
    let alice = Caller::new("alice");

    users
        .update_private_profile(
            &alice,
            ProfileUpdate {
                user_id: "alice".to_owned(),
                nick_name: Some("Al".to_owned()),
                brief: Some("new brief".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let own = users
        .private_profile(&alice, "alice", Preview::default())
        .await
        .unwrap();
    assert_eq!(own.public.nick_name.as_deref(), Some("Al"));
    assert_eq!(own.public.brief.as_deref(), Some("new brief"));
    assert_eq!(own.family_name, None);
    assert_eq!(own.public.gender, None);
    assert_eq!(own.login_count, 3);
    assert!(own.public.updated_at.is_some());
}

#[tokio::test]
async fn profile_update_rules() {
    let store = memory_store(&["alice", "bob"]).await;
    store.insert_user(&user("ghost"), None).await.unwrap();
    let users = UserService::new(store);

    let err = users
        .update_private_profile(
            &Caller::new("bob"),
            ProfileUpdate {
                user_id: "alice".to_owned(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = users
        .update_private_profile(
            &Caller::new("ghost"),
            ProfileUpdate {
                user_id: "ghost".to_owned(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { what: "profile" }));

    let err = users
        .update_private_profile(
            &Caller::new("alice"),
            ProfileUpdate {
                user_id: "alice".to_owned(),
                version: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn losing_a_profile_write_race_is_a_conflict() {
    let users = UserService::new(racing_store(&["alice"]).await);
    let alice = Caller::new("alice");

    let err = users
        .update_private_profile(
            &alice,
            ProfileUpdate {
                user_id: "alice".to_owned(),
                nick_name: Some("Al".to_owned()),
                brief: Some("mine".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let own = users
        .private_profile(&alice, "alice", Preview::default())
        .await
        .unwrap();
    assert_eq!(own.public.nick_name.as_deref(), Some(RIVAL_EDIT));
    assert_eq!(own.public.brief.as_deref(), Some("hello"));
    assert_eq!(own.family_name.as_deref(), Some("Family"));
}

#[tokio::test]
async fn follow_lists_point_the_right_way() {
    let (meetups, users) = services(&["alice", "bob", "carol"]).await;
    let alice = Caller::new("alice");
    let carol = Caller::new("carol");

    users.follow(&alice, "bob").await.unwrap();
    users.follow(&carol, "alice").await.unwrap();
    meetups.create(&Caller::new("bob"), coffee("bob")).await.unwrap();

    let following = users.following("alice").await.unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].user_id, "bob");
    assert_eq!(following[0].nick_name.as_deref(), Some("bob nick"));
    assert_eq!(following[0].launched_meetups_total, 1);
    assert_eq!(following[0].joined_meetups_total, 0);

    let followers = users.followed_by("alice").await.unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].user_id, "carol");

    assert!(users.following("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn follow_rules() {
    let (_, users) = services(&["alice", "bob"]).await;
    let alice = Caller::new("alice");

    assert!(matches!(
        users.follow(&alice, "alice").await,
        Err(AppError::Validation { field: "followedUserId", .. })
    ));
    assert!(matches!(
        users.follow(&alice, "nobody").await,
        Err(AppError::NotFound { what: "user" })
    ));

    let follow = users.follow(&alice, "bob").await.unwrap();
    assert_eq!(follow.following_user_id, "alice");
    assert_eq!(follow.followed_user_id, "bob");
    assert!(matches!(users.follow(&alice, "bob").await, Err(AppError::Conflict(_))));

    users.unfollow(&alice, "bob").await.unwrap();
    assert!(users.following("alice").await.unwrap().is_empty());
    assert!(matches!(
        users.unfollow(&alice, "bob").await,
        Err(AppError::NotFound { what: "follow" })
    ));
}

#[tokio::test]
async fn logged_user_reports_caller() {
    let (_, users) = services(&["alice"]).await;

    let me = users.logged_user(&Caller::new("alice")).await.unwrap();
    assert_eq!(me.user_id, "alice");
    assert_eq!(me.user_name, "alice_name");

    assert!(matches!(
        users.logged_user(&Caller::new("nobody")).await,
        Err(AppError::NotFound { .. })
    ));
}
