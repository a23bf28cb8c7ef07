use academy_core::db::open_db_in_memory;
use academy_core::repo::{
    CourseCascade, SqliteCourseRepository, SqliteFeedbackRepository, SqliteLessonRepository,
    SqliteTeacherRepository, SqliteUserRepository,
};
use academy_core::{
    Course, CourseOrder, DisplayName, EntityKind, EntityRepository, LessonOrder,
    LifecycleService, ListQuery, NewCourse, NewFeedback, NewLesson, NewTeacher, NewUser, Record,
    RecordId, RepoError, RetireRepository, Retireable, TeacherOrder, ValidationError,
};
use rusqlite::Connection;

fn course(conn: &Connection, name: &str) -> Course {
    SqliteCourseRepository::try_new(conn)
        .unwrap()
        .create(&NewCourse::new(name))
        .unwrap()
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn course_defaults_and_cost_bounds() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCourseRepository::try_new(&conn).unwrap();

    let created = repo.create(&NewCourse::new("Rust")).unwrap();
    assert_eq!(created.cost_cents, 0);
    assert_eq!(created.cover, "no_image.svg");
    assert_eq!(created.display_name(), format!("{} Rust", created.id));

    let mut expensive = NewCourse::new("Gold");
    expensive.cost_cents = 100_000_000;
    assert!(matches!(
        repo.create(&expensive),
        Err(RepoError::Validation(ValidationError::CostOutOfRange(100_000_000)))
    ));

    expensive.cost_cents = 99_999_999;
    assert_eq!(repo.create(&expensive).unwrap().cost_cents, 99_999_999);
}

#[test]
fn course_orders_by_insertion_or_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCourseRepository::try_new(&conn).unwrap();

    let zig = repo.create(&NewCourse::new("zig")).unwrap();
    let ada = repo.create(&NewCourse::new("Ada")).unwrap();

    let inserted: Vec<_> = repo
        .list(&ListQuery::default())
        .unwrap()
        .items
        .into_iter()
        .map(|course| course.id)
        .collect();
    assert_eq!(inserted, vec![zig.id, ada.id]);

    let by_name: Vec<_> = repo
        .list(&ListQuery::default().ordered_by(CourseOrder::Name))
        .unwrap()
        .items
        .into_iter()
        .map(|course| course.id)
        .collect();
    assert_eq!(by_name, vec![ada.id, zig.id]);
}

#[test]
fn lessons_list_by_course_then_number() {
    let conn = open_db_in_memory().unwrap();
    let first = course(&conn, "Basics");
    let repo = SqliteLessonRepository::try_new(&conn).unwrap();

    let second_lesson = repo.create(&NewLesson::new(first.id, 2, "Ownership")).unwrap();
    let first_lesson = repo.create(&NewLesson::new(first.id, 1, "Hello")).unwrap();

    let listed: Vec<_> = repo
        .list(&ListQuery::default())
        .unwrap()
        .items
        .into_iter()
        .map(|lesson| lesson.num)
        .collect();
    assert_eq!(listed, vec![1, 2]);

    assert_eq!(first_lesson.course_name, "Basics");
    assert_eq!(second_lesson.display_name(), "Basics | 2 | Ownership");
}

#[test]
fn lesson_admin_order_sorts_course_name_then_number_descending() {
    let conn = open_db_in_memory().unwrap();
    let zeta = course(&conn, "Zeta");
    let alpha = course(&conn, "alpha");
    let repo = SqliteLessonRepository::try_new(&conn).unwrap();

    repo.create(&NewLesson::new(zeta.id, 1, "z1")).unwrap();
    repo.create(&NewLesson::new(alpha.id, 1, "a1")).unwrap();
    repo.create(&NewLesson::new(alpha.id, 2, "a2")).unwrap();

    let titles: Vec<_> = repo
        .list(&ListQuery::default().ordered_by(LessonOrder::CourseNameThenNumDesc))
        .unwrap()
        .items
        .into_iter()
        .map(|lesson| lesson.title)
        .collect();
    assert_eq!(titles, vec!["a2", "a1", "z1"]);
}

#[test]
fn lesson_requires_existing_course() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLessonRepository::try_new(&conn).unwrap();

    let err = repo.create(&NewLesson::new(404, 1, "Orphan")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::UnknownReference {
            entity: EntityKind::Course,
            id: 404
        })
    ));
}

#[test]
fn retired_course_still_accepts_lessons() {
    let conn = open_db_in_memory().unwrap();
    let parent = course(&conn, "Legacy");
    SqliteCourseRepository::try_new(&conn)
        .unwrap()
        .retire(parent.id)
        .unwrap();

    let lesson = SqliteLessonRepository::try_new(&conn)
        .unwrap()
        .create(&NewLesson::new(parent.id, 1, "Still here"))
        .unwrap();
    assert_eq!(lesson.course_id, parent.id);
}

#[test]
fn retiring_course_keeps_lessons_visible() {
    let conn = open_db_in_memory().unwrap();
    let parent = course(&conn, "Sunset");
    let lessons = SqliteLessonRepository::try_new(&conn).unwrap();
    let lesson = lessons.create(&NewLesson::new(parent.id, 1, "Intro")).unwrap();

    let courses = LifecycleService::new(SqliteCourseRepository::try_new(&conn).unwrap());
    courses.retire(parent.id).unwrap();

    assert_eq!(courses.list(&ListQuery::default()).unwrap().total, 0);
    let visible = lessons.list(&ListQuery::default()).unwrap();
    assert_eq!(visible.items.len(), 1);
    assert_eq!(visible.items[0].id, lesson.id);
    assert!(!visible.items[0].is_retired);
}

/// Retires `retired`, then checks the default listing, the detail read and
/// a repeated retire against the stored row.
fn assert_retire_hides_from_listing_only<R>(repo: &R, kept: RecordId, retired: RecordId)
where
    R: RetireRepository,
    R::Entity: Retireable + PartialEq + std::fmt::Debug,
{
    repo.retire(retired).unwrap();

    let listed: Vec<_> = repo
        .list(&ListQuery::default())
        .unwrap()
        .items
        .iter()
        .map(|entity| entity.id())
        .collect();
    assert_eq!(listed, vec![kept]);
    assert_eq!(repo.list(&ListQuery::including_retired()).unwrap().total, 2);

    let detail = repo.get(retired).unwrap().expect("retired row stays readable");
    assert!(detail.is_retired());

    repo.retire(retired).unwrap();
    assert_eq!(repo.get(retired).unwrap(), Some(detail));
}

#[test]
fn retired_course_is_unlisted_but_readable() {
    let conn = open_db_in_memory().unwrap();
    let kept = course(&conn, "Kept");
    let retired = course(&conn, "Retired");

    let repo = SqliteCourseRepository::try_new(&conn).unwrap();
    assert_retire_hides_from_listing_only(&repo, kept.id, retired.id);
}

#[test]
fn retired_lesson_is_unlisted_but_readable() {
    let conn = open_db_in_memory().unwrap();
    let parent = course(&conn, "Rust");
    let repo = SqliteLessonRepository::try_new(&conn).unwrap();
    let kept = repo.create(&NewLesson::new(parent.id, 1, "Kept")).unwrap();
    let retired = repo.create(&NewLesson::new(parent.id, 2, "Retired")).unwrap();

    assert_retire_hides_from_listing_only(&repo, kept.id, retired.id);
}

#[test]
fn retired_teacher_is_unlisted_but_readable() {
    let conn = open_db_in_memory().unwrap();
    let parent = course(&conn, "Rust");
    let repo = SqliteTeacherRepository::try_new(&conn).unwrap();
    let kept = repo
        .create(&NewTeacher::new("Kept", "One", "1980-01-01"))
        .unwrap();
    let retired = repo
        .create(&NewTeacher::new("Retired", "Two", "1970-01-01").with_courses([parent.id]))
        .unwrap();

    assert_retire_hides_from_listing_only(&repo, kept.id, retired.id);
    let detail = repo.get(retired.id).unwrap().unwrap();
    assert_eq!(detail.course_ids, vec![parent.id]);
}

#[test]
fn lessons_for_course_filters_by_parent() {
    let conn = open_db_in_memory().unwrap();
    let first = course(&conn, "First");
    let second = course(&conn, "Second");
    let service = LifecycleService::new(SqliteLessonRepository::try_new(&conn).unwrap());

    service.create(&NewLesson::new(first.id, 1, "f1")).unwrap();
    let retired = service.create(&NewLesson::new(first.id, 2, "f2")).unwrap();
    service.create(&NewLesson::new(second.id, 1, "s1")).unwrap();
    service.retire(retired.id).unwrap();

    let page = service
        .lessons_for_course(first.id, &ListQuery::default())
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "f1");

    let all = service
        .lessons_for_course(first.id, &ListQuery::including_retired())
        .unwrap();
    assert_eq!(all.total, 2);

    assert_eq!(
        service
            .lessons_for_course(999, &ListQuery::default())
            .unwrap()
            .total,
        0
    );
}

#[test]
fn lesson_update_can_move_to_another_course() {
    let conn = open_db_in_memory().unwrap();
    let from = course(&conn, "From");
    let to = course(&conn, "To");
    let repo = SqliteLessonRepository::try_new(&conn).unwrap();

    let mut lesson = repo.create(&NewLesson::new(from.id, 1, "Moving")).unwrap();
    lesson.course_id = to.id;
    lesson.num = 3;
    let moved = repo.update(&lesson).unwrap();
    assert_eq!(moved.course_id, to.id);
    assert_eq!(moved.course_name, "To");
    assert_eq!(moved.num, 3);

    lesson.course_id = 404;
    assert!(matches!(
        repo.update(&lesson),
        Err(RepoError::Validation(ValidationError::UnknownReference { .. }))
    ));
}

#[test]
fn course_hard_delete_cascades_to_lessons_feedback_and_links() {
    let conn = open_db_in_memory().unwrap();
    let doomed = course(&conn, "Doomed");
    let survivor = course(&conn, "Survivor");

    let lessons = SqliteLessonRepository::try_new(&conn).unwrap();
    lessons.create(&NewLesson::new(doomed.id, 1, "d1")).unwrap();
    lessons.create(&NewLesson::new(doomed.id, 2, "d2")).unwrap();
    let kept = lessons.create(&NewLesson::new(survivor.id, 1, "s1")).unwrap();

    let user = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create(&NewUser::new("reviewer", "reviewer@example.com"))
        .unwrap();
    SqliteFeedbackRepository::try_new(&conn)
        .unwrap()
        .create(&NewFeedback::new(doomed.id, user.id))
        .unwrap();

    let teacher = SqliteTeacherRepository::try_new(&conn)
        .unwrap()
        .create(&NewTeacher::new("Ada", "Lovelace", "1815-12-10").with_courses([doomed.id, survivor.id]))
        .unwrap();

    let service = LifecycleService::new(SqliteCourseRepository::try_new(&conn).unwrap());
    let report = service.hard_delete_course(doomed.id).unwrap();
    assert_eq!(
        report,
        CourseCascade {
            lessons: 2,
            feedback: 1,
            teacher_links: 1,
        }
    );

    let remaining: Vec<_> = lessons
        .list(&ListQuery::including_retired())
        .unwrap()
        .items
        .into_iter()
        .map(|lesson| lesson.id)
        .collect();
    assert_eq!(remaining, vec![kept.id]);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM course_feedback;"), 0);

    let teacher = SqliteTeacherRepository::try_new(&conn)
        .unwrap()
        .get(teacher.id)
        .unwrap()
        .unwrap();
    assert_eq!(teacher.course_ids, vec![survivor.id]);
}

#[test]
fn course_hard_delete_through_generic_entry_point() {
    let conn = open_db_in_memory().unwrap();
    let doomed = course(&conn, "Doomed");
    SqliteLessonRepository::try_new(&conn)
        .unwrap()
        .create(&NewLesson::new(doomed.id, 1, "d1"))
        .unwrap();

    let service = LifecycleService::new(SqliteCourseRepository::try_new(&conn).unwrap());
    service.hard_delete(doomed.id).unwrap();

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM lessons;"), 0);
    assert!(matches!(
        service.hard_delete(doomed.id),
        Err(RepoError::NotFound {
            entity: EntityKind::Course,
            ..
        })
    ));
}

#[test]
fn teacher_hard_delete_removes_links_but_keeps_courses() {
    let conn = open_db_in_memory().unwrap();
    let first = course(&conn, "First");
    let second = course(&conn, "Second");
    let service = LifecycleService::new(SqliteTeacherRepository::try_new(&conn).unwrap());

    let teacher = service
        .create(&NewTeacher::new("Grace", "Hopper", "1906-12-09").with_courses([first.id, second.id]))
        .unwrap();
    assert_eq!(teacher.course_ids, vec![first.id, second.id]);

    service.hard_delete(teacher.id).unwrap();

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM course_teachers;"), 0);
    let courses = SqliteCourseRepository::try_new(&conn)
        .unwrap()
        .list(&ListQuery::default())
        .unwrap();
    assert_eq!(courses.total, 2);
}

#[test]
fn teacher_assignment_is_idempotent_and_reversible() {
    let conn = open_db_in_memory().unwrap();
    let rust = course(&conn, "Rust");
    let service = LifecycleService::new(SqliteTeacherRepository::try_new(&conn).unwrap());
    let teacher = service
        .create(&NewTeacher::new("Niklaus", "Wirth", "1934-02-15"))
        .unwrap();
    assert!(teacher.course_ids.is_empty());

    assert!(service.assign_course(teacher.id, rust.id).unwrap());
    assert!(!service.assign_course(teacher.id, rust.id).unwrap());
    assert_eq!(service.get(teacher.id).unwrap().course_ids, vec![rust.id]);

    let taught = service.courses_for_teacher(teacher.id, false).unwrap();
    assert_eq!(taught.len(), 1);
    assert_eq!(taught[0].name, "Rust");

    let staff = service.teachers_for_course(rust.id, false).unwrap();
    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].id, teacher.id);

    assert!(service.unassign_course(teacher.id, rust.id).unwrap());
    assert!(!service.unassign_course(teacher.id, rust.id).unwrap());
    assert!(service.teachers_for_course(rust.id, false).unwrap().is_empty());
}

#[test]
fn teacher_assignment_checks_both_ends() {
    let conn = open_db_in_memory().unwrap();
    let rust = course(&conn, "Rust");
    let service = LifecycleService::new(SqliteTeacherRepository::try_new(&conn).unwrap());
    let teacher = service
        .create(&NewTeacher::new("Barbara", "Liskov", "1939-11-07"))
        .unwrap();

    assert!(matches!(
        service.assign_course(404, rust.id),
        Err(RepoError::NotFound {
            entity: EntityKind::Teacher,
            id: 404
        })
    ));
    assert!(matches!(
        service.assign_course(teacher.id, 404),
        Err(RepoError::Validation(ValidationError::UnknownReference {
            entity: EntityKind::Course,
            id: 404
        }))
    ));
    assert!(matches!(
        service.create(&NewTeacher::new("No", "Course", "2000-01-01").with_courses([404])),
        Err(RepoError::Validation(ValidationError::UnknownReference { .. }))
    ));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM teachers;"), 1);
}

#[test]
fn relation_queries_respect_visibility() {
    let conn = open_db_in_memory().unwrap();
    let live = course(&conn, "Live");
    let old = course(&conn, "Old");
    SqliteCourseRepository::try_new(&conn)
        .unwrap()
        .retire(old.id)
        .unwrap();

    let service = LifecycleService::new(SqliteTeacherRepository::try_new(&conn).unwrap());
    let active = service
        .create(&NewTeacher::new("Active", "One", "1980-01-01").with_courses([live.id, old.id]))
        .unwrap();
    let retired = service
        .create(&NewTeacher::new("Retired", "Two", "1970-01-01").with_courses([live.id]))
        .unwrap();
    service.retire(retired.id).unwrap();

    assert_eq!(service.courses_for_teacher(active.id, false).unwrap().len(), 1);
    assert_eq!(service.courses_for_teacher(active.id, true).unwrap().len(), 2);

    let visible: Vec<_> = service
        .teachers_for_course(live.id, false)
        .unwrap()
        .into_iter()
        .map(|teacher| teacher.id)
        .collect();
    assert_eq!(visible, vec![active.id]);
    assert_eq!(service.teachers_for_course(live.id, true).unwrap().len(), 2);
}

#[test]
fn teacher_update_replaces_course_set() {
    let conn = open_db_in_memory().unwrap();
    let first = course(&conn, "First");
    let second = course(&conn, "Second");
    let repo = SqliteTeacherRepository::try_new(&conn).unwrap();

    let mut teacher = repo
        .create(&NewTeacher::new("Alan", "Turing", "1912-06-23").with_courses([first.id]))
        .unwrap();
    teacher.course_ids = vec![second.id];
    teacher.last_name = "Mathison Turing".to_string();

    let stored = repo.update(&teacher).unwrap();
    assert_eq!(stored.course_ids, vec![second.id]);
    assert_eq!(stored.last_name, "Mathison Turing");
    assert!(!stored.is_retired);
}

#[test]
fn teacher_listing_orders_and_formats() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTeacherRepository::try_new(&conn).unwrap();

    let zuse = repo
        .create(&NewTeacher::new("Konrad", "Zuse", "1910-06-22"))
        .unwrap();
    let babbage = repo
        .create(&NewTeacher::new("Charles", "Babbage", "1791-12-26"))
        .unwrap();
    assert_eq!(babbage.display_name(), format!("{:0>3} Babbage Charles", babbage.id));

    let by_surname: Vec<_> = repo
        .list(&ListQuery::default().ordered_by(TeacherOrder::Surname))
        .unwrap()
        .items
        .into_iter()
        .map(|teacher| teacher.id)
        .collect();
    assert_eq!(by_surname, vec![babbage.id, zuse.id]);
}

#[test]
fn teacher_birth_date_must_be_iso_shaped() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTeacherRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.create(&NewTeacher::new("Edsger", "Dijkstra", "11/05/1930")),
        Err(RepoError::Validation(ValidationError::InvalidBirthDate(_)))
    ));
}
