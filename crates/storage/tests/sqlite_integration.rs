use lms_core::model::{Course, Lesson, Question, Quiz, Score, User, UserId};
use lms_core::time::fixed_now;
use storage::repository::{KeyValueStore, Storage, StorageError};
use storage::sqlite::SqliteRepository;

fn course() -> Course {
    let lessons = ["intro", "basics"]
        .into_iter()
        .map(|id| {
            let q = Question::new(
                "q1".parse().unwrap(),
                "Which one?",
                vec!["this".into(), "that".into()],
                0,
            )
            .unwrap();
            let quiz = Quiz::new(Score::new(80).unwrap(), vec![q]).unwrap();
            Lesson::new(id.parse().unwrap(), id, "content", None, quiz).unwrap()
        })
        .collect();
    Course::new("sqlite-course".parse().unwrap(), "Course", "", lessons).unwrap()
}

#[tokio::test]
async fn sqlite_kv_overwrites_and_reads_back() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // second run is a no-op
    repo.migrate().await.expect("migrate twice");

    assert!(repo.read("missing").await.unwrap().is_none());
    repo.write("k", "first".into()).await.unwrap();
    repo.write("k", "second".into()).await.unwrap();
    assert_eq!(repo.read("k").await.unwrap().as_deref(), Some("second"));
}

#[tokio::test]
async fn sqlite_storage_persists_progress_and_users() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let course = course();
    let user = User::register(
        UserId::generate(),
        "Grace",
        "grace@example.com",
        "hash".into(),
        fixed_now(),
    )
    .unwrap();
    storage.users.insert(&user).await.unwrap();
    assert!(matches!(
        storage.users.insert(&user).await.unwrap_err(),
        StorageError::Conflict
    ));

    let recorded = storage
        .progress
        .record_quiz_result(
            user.id(),
            &course,
            &"intro".parse().unwrap(),
            Score::PERFECT,
            true,
        )
        .await
        .unwrap();
    assert!(!recorded.progress.certificate_issued());

    let reread = storage
        .progress
        .get(user.id(), &course)
        .await
        .unwrap()
        .expect("progress persisted");
    assert_eq!(reread, recorded.progress);

    let found = storage
        .users
        .find_by_email("grace@example.com")
        .await
        .unwrap();
    assert_eq!(found, Some(user));
}

#[tokio::test]
async fn sqlite_corrupt_progress_is_reinitialized() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    let storage = Storage::new(std::sync::Arc::new(repo.clone()));
    let course = course();
    let user_id: UserId = "learner".parse().unwrap();

    let key = storage::ProgressStore::key(&user_id, course.id());
    repo.write(&key, "{\"userId\":".into()).await.unwrap();

    let progress = storage
        .progress
        .load_or_initialize(&user_id, &course)
        .await
        .unwrap();
    assert!(progress.completed_lesson_ids().is_empty());
    let raw = repo.read(&key).await.unwrap().unwrap();
    assert!(raw.contains("\"certificateIssued\":false"));
}
