use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{Attempt, AttemptError, CategoryKind, Difficulty, QuestionId, SessionStatus};
use quiz_core::session_clock;
use quiz_core::time::fixed_now;
use services::{AppServices, Clock, GameError, GameSettings};
use storage::repository::{QuestionFilter, Storage};
use storage::seed;
use tempfile::TempDir;

async fn file_backed_app(dir: &TempDir, settings: GameSettings) -> (AppServices, Storage) {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("quiz.sqlite3").display());
    let storage = Storage::sqlite(&url).await.unwrap();
    seed::load_seed(&storage, fixed_now(), false).await.unwrap();
    let app = AppServices::from_storage(&storage, Clock::fixed(fixed_now()), settings);
    (app, storage)
}

async fn python_def_question(storage: &Storage) -> QuestionId {
    let filter = QuestionFilter {
        category: Some(CategoryKind::Python),
        difficulty: Some(Difficulty::Beginner),
        ..QuestionFilter::default()
    };
    storage
        .catalog
        .list_questions(filter)
        .await
        .unwrap()
        .into_iter()
        .find(|q| q.answer() == "def")
        .map(|q| q.id())
        .unwrap()
}

fn manual() -> GameSettings {
    GameSettings::new(60, false).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    fixed_now() + Duration::seconds(secs)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_guesses_never_share_an_attempt_number() {
    let dir = TempDir::new().unwrap();
    let (app, storage) = file_backed_app(&dir, manual()).await;
    let (player, _) = app.players().register("ada").await.unwrap();
    let qid = python_def_question(&storage).await;
    let sid = app
        .game()
        .start_session(player.id(), qid)
        .await
        .unwrap()
        .session
        .id();

    let mut handles = Vec::new();
    for n in 0..10 {
        let game = app.game();
        handles.push(tokio::spawn(async move {
            game.submit_answer_at(sid, &format!("guess{n}"), at(1)).await
        }));
    }

    let mut claimed = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => claimed.push(result.attempt.number()),
            Err(GameError::Attempt(
                AttemptError::SequenceConflict { .. } | AttemptError::AttemptLimitExceeded { .. },
            )) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let unique: BTreeSet<u32> = claimed.iter().copied().collect();
    assert_eq!(unique.len(), claimed.len());
    assert!(!claimed.is_empty());

    let stored = app.game().status_at(sid, at(2)).await.unwrap();
    let numbers: Vec<u32> = stored.attempts.iter().map(Attempt::number).collect();
    let expected: Vec<u32> = (1..=u32::try_from(claimed.len()).unwrap()).collect();
    assert_eq!(numbers, expected);
    assert_eq!(unique.into_iter().collect::<Vec<_>>(), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn completion_racing_a_guess_settles_on_one_outcome() {
    let dir = TempDir::new().unwrap();
    let (app, storage) = file_backed_app(&dir, manual()).await;
    let (player, _) = app.players().register("grace").await.unwrap();
    let qid = python_def_question(&storage).await;
    let sid = app
        .game()
        .start_session(player.id(), qid)
        .await
        .unwrap()
        .session
        .id();

    let guesser = app.game();
    let guess = tokio::spawn(async move { guesser.submit_answer_at(sid, "def", at(3)).await });
    let completer = app.game();
    let complete = tokio::spawn(async move { completer.complete_at(sid, at(3)).await });

    let guess = guess.await.unwrap();
    let outcome = complete.await.unwrap().unwrap();

    let stored = app.game().status_at(sid, at(4)).await.unwrap();
    assert_eq!(outcome.status, stored.status);
    assert_eq!(stored.session.score(), session_clock::score_for(&stored.attempts));

    match guess {
        Ok(_) => {
            assert_eq!(outcome.status, SessionStatus::Won);
            assert_eq!(stored.session.score(), 60);
        }
        Err(err) => {
            assert!(matches!(
                err,
                GameError::Attempt(AttemptError::SessionClosed { .. })
            ));
            assert_eq!(outcome.status, SessionStatus::Lost);
            assert!(stored.attempts.is_empty());
        }
    }

    let stats = app.players().stats(player.id()).await.unwrap();
    assert_eq!(stats.experience_points(), outcome.xp_awarded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_wins_both_count_towards_experience() {
    let dir = TempDir::new().unwrap();
    let (app, storage) = file_backed_app(&dir, GameSettings::default()).await;
    let (player, _) = app.players().register("katherine").await.unwrap();
    let qid = python_def_question(&storage).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let sid = app
            .game()
            .start_session(player.id(), qid)
            .await
            .unwrap()
            .session
            .id();
        let game = app.game();
        handles.push(tokio::spawn(async move {
            game.submit_answer_at(sid, "def", at(2)).await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.status, SessionStatus::Won);
        assert_eq!(result.outcome.unwrap().xp_awarded, 60);
    }

    let stats = app.players().stats(player.id()).await.unwrap();
    assert_eq!(stats.experience_points(), 120);
    assert_eq!(stats.player_level(), 2);
}
