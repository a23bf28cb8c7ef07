use academy_core::db::open_db_in_memory;
use academy_core::repo::{
    SqliteCourseRepository, SqliteFeedbackRepository, SqliteUserRepository,
};
use academy_core::{
    listing_counts, DisplayName, EntityKind, EntityRepository, LifecycleService, ListQuery,
    NewCourse, NewFeedback, NewUser, Rating, RepoError, RetireRepository, UserOrder,
    ValidationError,
};
use rusqlite::Connection;

fn seed_course(conn: &Connection, name: &str) -> i64 {
    SqliteCourseRepository::try_new(conn)
        .unwrap()
        .create(&NewCourse::new(name))
        .unwrap()
        .id
}

fn seed_user(conn: &Connection, username: &str) -> i64 {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create(&NewUser::new(username, format!("{username}@example.com")))
        .unwrap()
        .id
}

#[test]
fn user_create_normalizes_email_and_sets_defaults() {
    let conn = open_db_in_memory().unwrap();
    let service = LifecycleService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let mut draft = NewUser::new("ada.l", "  Ada@Example.COM ");
    draft.first_name = "Ada".to_string();
    draft.last_name = "Lovelace".to_string();
    let user = service.create(&draft).unwrap();

    assert_eq!(user.email, "Ada@example.com");
    assert!(user.is_active);
    assert!(!user.is_staff);
    assert!(user.date_joined > 0);
    assert_eq!(user.full_name(), "Ada Lovelace");
    assert_eq!(user.short_name(), "Ada");
    assert_eq!(user.display_name(), "ada.l");

    let found = service.find_by_email("ada@EXAMPLE.com").unwrap();
    assert!(found.is_none(), "local part stays case-sensitive");
    let found = service.find_by_email("Ada@EXAMPLE.com").unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(
        service.find_by_username("ada.l").unwrap().map(|u| u.id),
        Some(user.id)
    );
}

#[test]
fn duplicate_username_or_email_fails_validation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.create(&NewUser::new("grace", "grace@example.com"))
        .unwrap();

    assert!(matches!(
        repo.create(&NewUser::new("grace", "other@example.com")),
        Err(RepoError::Validation(ValidationError::DuplicateUsername(name))) if name == "grace"
    ));
    assert!(matches!(
        repo.create(&NewUser::new("hopper", "grace@EXAMPLE.com")),
        Err(RepoError::Validation(ValidationError::DuplicateEmail(_)))
    ));

    let listed = repo.list(&ListQuery::default()).unwrap();
    assert_eq!(listed.total, 1);
}

#[test]
fn update_into_taken_username_fails_validation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.create(&NewUser::new("alice", "alice@example.com"))
        .unwrap();
    let mut bob = repo
        .create(&NewUser::new("bob", "bob@example.com"))
        .unwrap();

    bob.username = "alice".to_string();
    assert!(matches!(
        repo.update(&bob),
        Err(RepoError::Validation(ValidationError::DuplicateUsername(_)))
    ));
}

#[test]
fn invalid_usernames_and_emails_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.create(&NewUser::new("has space", "x@example.com")),
        Err(RepoError::Validation(ValidationError::InvalidUsername(_)))
    ));
    assert!(matches!(
        repo.create(&NewUser::new("valid", "no-at-sign")),
        Err(RepoError::Validation(ValidationError::InvalidEmail(_)))
    ));
}

#[test]
fn deactivate_is_idempotent_and_users_stay_listed() {
    let conn = open_db_in_memory().unwrap();
    let service = LifecycleService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let id = seed_user(&conn, "sleepy");

    service.deactivate(id).unwrap();
    service.deactivate(id).unwrap();
    assert!(!service.get(id).unwrap().is_active);
    assert_eq!(service.list(&ListQuery::default()).unwrap().total, 1);

    service.activate(id).unwrap();
    service.set_staff(id, true).unwrap();
    let user = service.get(id).unwrap();
    assert!(user.is_active);
    assert!(user.is_staff);

    assert!(matches!(
        service.deactivate(404),
        Err(RepoError::NotFound {
            entity: EntityKind::User,
            id: 404
        })
    ));
}

#[test]
fn user_update_keeps_active_flag_and_join_date() {
    let conn = open_db_in_memory().unwrap();
    let service = LifecycleService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let id = seed_user(&conn, "keeper");
    service.deactivate(id).unwrap();

    let mut user = service.get(id).unwrap();
    let joined = user.date_joined;
    user.is_active = true;
    user.date_joined = 1;
    user.age = Some(37);

    let stored = service.update(&user).unwrap();
    assert!(!stored.is_active);
    assert_eq!(stored.date_joined, joined);
    assert_eq!(stored.age, Some(37));
}

#[test]
fn users_order_by_username_on_request() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let zed = seed_user(&conn, "zed");
    let amy = seed_user(&conn, "amy");

    let newest_first: Vec<_> = repo
        .list(&ListQuery::default())
        .unwrap()
        .items
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert_eq!(newest_first, vec![amy, zed]);

    let by_name: Vec<_> = repo
        .list(&ListQuery::default().ordered_by(UserOrder::Username))
        .unwrap()
        .items
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert_eq!(by_name, vec![amy, zed]);
}

#[test]
fn user_with_feedback_cannot_be_hard_deleted_until_feedback_is_gone() {
    let conn = open_db_in_memory().unwrap();
    let course_id = seed_course(&conn, "Rust");
    let user_id = seed_user(&conn, "critic");
    let feedback = SqliteFeedbackRepository::try_new(&conn)
        .unwrap()
        .create(&NewFeedback::new(course_id, user_id))
        .unwrap();

    let users = LifecycleService::new(SqliteUserRepository::try_new(&conn).unwrap());
    match users.hard_delete(user_id) {
        Err(RepoError::Constraint { entity, id, reason }) => {
            assert_eq!(entity, EntityKind::User);
            assert_eq!(id, user_id);
            assert!(reason.contains("1 feedback"));
        }
        other => panic!("expected constraint error, got {other:?}"),
    }
    assert!(users.get(user_id).is_ok());

    SqliteFeedbackRepository::try_new(&conn)
        .unwrap()
        .hard_delete(feedback.id)
        .unwrap();
    users.hard_delete(user_id).unwrap();
    assert!(users.repo().get(user_id).unwrap().is_none());
}

#[test]
fn feedback_rating_is_bounded() {
    let conn = open_db_in_memory().unwrap();
    let course_id = seed_course(&conn, "Rust");
    let user_id = seed_user(&conn, "rater");
    let repo = SqliteFeedbackRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.create(&NewFeedback::new(course_id, user_id).with_rating(6)),
        Err(RepoError::Validation(ValidationError::RatingOutOfRange(6)))
    ));
    assert!(matches!(
        repo.create(&NewFeedback::new(course_id, user_id).with_rating(0)),
        Err(RepoError::Validation(ValidationError::RatingOutOfRange(0)))
    ));

    let stored = repo
        .create(&NewFeedback::new(course_id, user_id).with_rating(5))
        .unwrap();
    assert_eq!(stored.rating, Rating::Five);
    assert_eq!(stored.comment, "No feedback");
    assert_eq!(stored.course_name, "Rust");
    assert_eq!(stored.username, "rater");
    assert_eq!(stored.display_name(), format!("{course_id} Rust (rater)"));
}

#[test]
fn feedback_requires_existing_course_and_user() {
    let conn = open_db_in_memory().unwrap();
    let course_id = seed_course(&conn, "Rust");
    let user_id = seed_user(&conn, "ghostwriter");
    let repo = SqliteFeedbackRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.create(&NewFeedback::new(404, user_id)),
        Err(RepoError::Validation(ValidationError::UnknownReference {
            entity: EntityKind::Course,
            id: 404
        }))
    ));
    assert!(matches!(
        repo.create(&NewFeedback::new(course_id, 404)),
        Err(RepoError::Validation(ValidationError::UnknownReference {
            entity: EntityKind::User,
            id: 404
        }))
    ));
}

#[test]
fn feedback_update_changes_comment_and_rating_only() {
    let conn = open_db_in_memory().unwrap();
    let course_id = seed_course(&conn, "Rust");
    let other_course = seed_course(&conn, "Go");
    let user_id = seed_user(&conn, "editor");
    let service = LifecycleService::new(SqliteFeedbackRepository::try_new(&conn).unwrap());

    let mut feedback = service
        .create(&NewFeedback::new(course_id, user_id).with_comment("ok"))
        .unwrap();
    assert!(!feedback.is_retired);
    feedback.comment = "great".to_string();
    feedback.rating = Rating::Three;
    feedback.course_id = other_course;
    feedback.is_retired = true;

    let stored = service.update(&feedback).unwrap();
    assert_eq!(stored.comment, "great");
    assert_eq!(stored.rating, Rating::Three);
    assert_eq!(stored.course_id, course_id);
    assert!(!stored.is_retired, "no write path raises the feedback flag");
}

#[test]
fn feedback_listing_ignores_retired_flag() {
    let conn = open_db_in_memory().unwrap();
    let course_id = seed_course(&conn, "Rust");
    let other_course = seed_course(&conn, "Go");
    let user_id = seed_user(&conn, "lister");
    let service = LifecycleService::new(SqliteFeedbackRepository::try_new(&conn).unwrap());

    let flagged = service
        .create(&NewFeedback::new(course_id, user_id))
        .unwrap();
    service
        .create(&NewFeedback::new(other_course, user_id))
        .unwrap();
    conn.execute(
        "UPDATE course_feedback SET is_retired = 1 WHERE id = ?1;",
        [flagged.id],
    )
    .unwrap();

    assert_eq!(service.list(&ListQuery::default()).unwrap().total, 2);
    let for_course = service
        .feedback_for_course(course_id, &ListQuery::default())
        .unwrap();
    assert_eq!(for_course.total, 1);
    assert!(for_course.items[0].is_retired);
}

#[test]
fn listing_counts_apply_visibility_per_kind() {
    let conn = open_db_in_memory().unwrap();
    let course_id = seed_course(&conn, "Rust");
    let retired_course = seed_course(&conn, "Old");
    SqliteCourseRepository::try_new(&conn)
        .unwrap()
        .retire(retired_course)
        .unwrap();
    let user_id = seed_user(&conn, "counter");
    SqliteFeedbackRepository::try_new(&conn)
        .unwrap()
        .create(&NewFeedback::new(course_id, user_id))
        .unwrap();

    let visible = listing_counts(&conn, false).unwrap();
    assert_eq!(visible.get(EntityKind::Course), 1);
    assert_eq!(visible.get(EntityKind::User), 1);
    assert_eq!(visible.get(EntityKind::Feedback), 1);
    assert_eq!(visible.get(EntityKind::News), 0);

    let all = listing_counts(&conn, true).unwrap();
    assert_eq!(all.courses, 2);
}
