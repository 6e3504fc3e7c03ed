use chrono::Duration;
use quiz_core::model::{
    Category, CategoryId, CategoryKind, Difficulty, GameSession, LocalizedText, Player, PlayerId,
    QuestionDraft, QuestionId, SessionId, SessionStatus, SubmittedAnswer,
};
use quiz_core::session_clock;
use quiz_core::time::fixed_now;
use storage::repository::{
    CatalogRepository, GameSessionRepository, NewSessionRecord, PlayerRepository, QuestionFilter,
    Storage, StorageError, TrophyRepository,
};
use storage::seed;
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn seed_question(repo: &SqliteRepository) -> QuestionId {
    let category = Category::new(
        CategoryId::new(0),
        CategoryKind::Python,
        LocalizedText::new("Python programming language", "Python 程式語言"),
        "fa-brands fa-python",
        2,
    )
    .unwrap();
    repo.ensure_category(&category).await.unwrap();

    let question = QuestionDraft {
        category: CategoryKind::Python,
        difficulty: Difficulty::Beginner,
        text: LocalizedText::new("What keyword defines a function?", "哪個關鍵字定義函數？"),
        code_snippet: Some("def greet():\n    print(\"Hello\")".into()),
        answer: "def".into(),
        hint: LocalizedText::english("Short for \"define\""),
        explanation: LocalizedText::english("def defines functions"),
    }
    .validate(QuestionId::new(0), fixed_now())
    .unwrap();
    let (id, created) = repo.ensure_question(&question).await.unwrap();
    assert!(created);
    id
}

async fn open_session(repo: &SqliteRepository) -> (SessionId, PlayerId) {
    let qid = seed_question(repo).await;
    let player = Player::new(PlayerId::new(0), "grace", fixed_now()).unwrap();
    let (player, stats) = repo.register_player(&player).await.unwrap();
    assert_eq!(stats.player_level(), 1);

    let draft = GameSession::start(
        SessionId::new(0),
        player.id(),
        qid,
        fixed_now(),
        Duration::seconds(60),
    )
    .unwrap();
    let sid = repo
        .create_session(NewSessionRecord::from_session(&draft))
        .await
        .unwrap();
    (sid, player.id())
}

#[tokio::test]
async fn sqlite_session_lifecycle_roundtrip() {
    let repo = connect("memdb_lifecycle").await;
    let (sid, pid) = open_session(&repo).await;

    for (offset, guess, correct) in [(5, "fn", false), (12, "def", true)] {
        let snapshot = repo.load_session(sid).await.unwrap();
        let attempt = session_clock::append_attempt(
            &snapshot.session,
            &snapshot.attempts,
            SubmittedAnswer::new(guess, correct),
            fixed_now() + Duration::seconds(offset),
        )
        .unwrap();
        repo.append_attempt(&attempt).await.unwrap();
    }

    let snapshot = repo.load_session(sid).await.unwrap();
    let numbers: Vec<u32> = snapshot.attempts.iter().map(|a| a.number()).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(
        snapshot.status(fixed_now() + Duration::seconds(20)),
        SessionStatus::InProgress
    );

    let completed_at = fixed_now() + Duration::seconds(13);
    let done = repo.complete_session(sid, completed_at).await.unwrap();
    assert_eq!(done.snapshot.session.score(), 50);
    assert_eq!(done.status, SessionStatus::Won);
    assert_eq!(done.xp_awarded, 50);
    assert_eq!(repo.get_stats(pid).await.unwrap().experience_points(), 50);

    let reloaded = repo.load_session(sid).await.unwrap();
    assert_eq!(reloaded.session.completed_at(), Some(completed_at));
    assert_eq!(reloaded.status(fixed_now() + Duration::hours(1)), SessionStatus::Won);

    let err = repo
        .complete_session(sid, completed_at + Duration::seconds(1))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::AlreadyCompleted(_)));

    let history = repo.list_sessions_for_player(pid, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].attempts.len(), 2);
}

#[tokio::test]
async fn sqlite_rejects_stale_attempt_numbers() {
    let repo = connect("memdb_stale").await;
    let (sid, _) = open_session(&repo).await;

    let snapshot = repo.load_session(sid).await.unwrap();
    let attempt = session_clock::append_attempt(
        &snapshot.session,
        &snapshot.attempts,
        SubmittedAnswer::new("lambda", false),
        fixed_now() + Duration::seconds(1),
    )
    .unwrap();
    repo.append_attempt(&attempt).await.unwrap();

    let err = repo.append_attempt(&attempt).await.unwrap_err();
    assert!(err.is_sequence_conflict());
    assert_eq!(repo.load_session(sid).await.unwrap().attempts.len(), 1);
}

#[tokio::test]
async fn sqlite_refuses_sessions_for_unknown_players() {
    let repo = connect("memdb_fk").await;
    let qid = seed_question(&repo).await;

    let record = NewSessionRecord {
        player_id: PlayerId::new(404),
        question_id: qid,
        started_at: fixed_now(),
        end_at: fixed_now() + Duration::seconds(60),
    };
    let err = repo.create_session(record).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_question_filter_and_deactivation() {
    let repo = connect("memdb_filter").await;
    let qid = seed_question(&repo).await;

    let random = QuestionFilter {
        category: Some(CategoryKind::Random),
        ..QuestionFilter::default()
    };
    assert_eq!(repo.list_questions(random).await.unwrap().len(), 1);

    let html = QuestionFilter {
        category: Some(CategoryKind::Html),
        ..QuestionFilter::default()
    };
    assert!(repo.list_questions(html).await.unwrap().is_empty());

    let mut question = repo.get_question(qid).await.unwrap();
    question.set_active(false, fixed_now() + Duration::minutes(1));
    repo.update_question(&question).await.unwrap();
    assert!(repo.list_questions(random).await.unwrap().is_empty());

    let stored = repo.get_question(qid).await.unwrap();
    assert!(!stored.is_active());
    assert_eq!(stored.text().zh.as_deref(), Some("哪個關鍵字定義函數？"));
}

#[tokio::test]
async fn sqlite_seed_is_idempotent() {
    let storage = Storage::sqlite("sqlite:file:memdb_seed?mode=memory&cache=shared")
        .await
        .expect("storage");

    let first = seed::load_seed(&storage, fixed_now(), false).await.unwrap();
    assert_eq!(first.questions_created, seed::question_count());
    assert!(first.trophies_created > 0);

    let second = seed::load_seed(&storage, fixed_now(), false).await.unwrap();
    assert_eq!(second.total(), 0);

    let trophies = storage.trophies.list_trophies().await.unwrap();
    assert_eq!(trophies.len(), first.trophies_created);
    let names: Vec<&str> = trophies.iter().map(|t| t.name().en.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);

    let categories = storage.catalog.list_categories().await.unwrap();
    assert_eq!(categories.first().map(Category::kind), Some(CategoryKind::Html));
}
