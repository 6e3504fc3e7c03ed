use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rng;
use rand::seq::IndexedRandom;

use quiz_core::model::{
    Attempt, CategoryKind, Difficulty, GameSession, MAX_ATTEMPTS, PlayerId, QuestionId, SessionId,
    SessionStatus,
};
use quiz_core::session_clock;
use storage::repository::{
    CatalogRepository, GameSessionRepository, NewSessionRecord, PlayerRepository, QuestionFilter,
    SessionSnapshot,
};

use crate::Clock;
use crate::config::GameSettings;
use crate::error::GameError;

/// A session as seen at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub session: GameSession,
    pub attempts: Vec<Attempt>,
    pub status: SessionStatus,
    pub remaining: Duration,
}

impl SessionView {
    #[must_use]
    pub fn from_snapshot(snapshot: SessionSnapshot, now: DateTime<Utc>) -> Self {
        let status = snapshot.status(now);
        let remaining = if status.is_terminal() || snapshot.session.is_completed() {
            Duration::zero()
        } else {
            snapshot.session.remaining(now)
        };
        Self {
            session: snapshot.session,
            attempts: snapshot.attempts,
            status,
            remaining,
        }
    }

    #[must_use]
    pub fn attempts_left(&self) -> u32 {
        let used = u32::try_from(self.attempts.len()).unwrap_or(MAX_ATTEMPTS);
        MAX_ATTEMPTS.saturating_sub(used)
    }
}

/// Result of completing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub session: GameSession,
    pub status: SessionStatus,
    pub xp_awarded: u32,
    pub player_level: u32,
    pub leveled_up: bool,
}

/// Result of a single guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAttempt {
    pub attempt: Attempt,
    pub status: SessionStatus,
    pub attempts_left: u32,
    /// Present when the guess finished the game and auto-complete is on.
    pub outcome: Option<SessionOutcome>,
}

/// Runs games: opens sessions, records guesses and closes them out.
#[derive(Clone)]
pub struct GameService {
    clock: Clock,
    settings: GameSettings,
    sessions: Arc<dyn GameSessionRepository>,
    catalog: Arc<dyn CatalogRepository>,
    players: Arc<dyn PlayerRepository>,
}

impl GameService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: GameSettings,
        sessions: Arc<dyn GameSessionRepository>,
        catalog: Arc<dyn CatalogRepository>,
        players: Arc<dyn PlayerRepository>,
    ) -> Self {
        Self {
            clock,
            settings,
            sessions,
            catalog,
            players,
        }
    }

    #[must_use]
    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    /// Open a session for `player` on a specific question.
    ///
    /// # Errors
    ///
    /// Returns `GameError::QuestionInactive` for retired questions and
    /// `GameError::Storage` if the player or question does not exist.
    pub async fn start_session(
        &self,
        player: PlayerId,
        question: QuestionId,
    ) -> Result<SessionView, GameError> {
        self.start_session_at(player, question, self.clock.now())
            .await
    }

    /// `start_session` at an explicit instant.
    ///
    /// # Errors
    ///
    /// See `start_session`.
    pub async fn start_session_at(
        &self,
        player: PlayerId,
        question: QuestionId,
        now: DateTime<Utc>,
    ) -> Result<SessionView, GameError> {
        self.players.get_player(player).await?;
        let question = self.catalog.get_question(question).await?;
        if !question.is_active() {
            return Err(GameError::QuestionInactive(question.id()));
        }
        self.open(player, question.id(), now).await
    }

    /// Open a session on a random active question. `None` or `CategoryKind::Random`
    /// draws from every category.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NoQuestions` if nothing matches.
    pub async fn start_random_session(
        &self,
        player: PlayerId,
        category: Option<CategoryKind>,
        difficulty: Option<Difficulty>,
    ) -> Result<SessionView, GameError> {
        self.start_random_session_at(player, category, difficulty, self.clock.now())
            .await
    }

    /// `start_random_session` at an explicit instant.
    ///
    /// # Errors
    ///
    /// See `start_random_session`.
    pub async fn start_random_session_at(
        &self,
        player: PlayerId,
        category: Option<CategoryKind>,
        difficulty: Option<Difficulty>,
        now: DateTime<Utc>,
    ) -> Result<SessionView, GameError> {
        self.players.get_player(player).await?;
        let candidates = self
            .catalog
            .list_questions(QuestionFilter {
                category,
                difficulty,
                ..QuestionFilter::default()
            })
            .await?;
        let question = candidates
            .choose(&mut rng())
            .map(|q| q.id())
            .ok_or(GameError::NoQuestions)?;
        self.open(player, question, now).await
    }

    async fn open(
        &self,
        player: PlayerId,
        question: QuestionId,
        now: DateTime<Utc>,
    ) -> Result<SessionView, GameError> {
        let draft = GameSession::start(
            SessionId::new(0),
            player,
            question,
            now,
            self.settings.session_duration(),
        )?;
        let id = self
            .sessions
            .create_session(NewSessionRecord::from_session(&draft))
            .await?;
        tracing::info!(
            session_id = id.value(),
            player_id = player.value(),
            question_id = question.value(),
            "session started"
        );
        let snapshot = SessionSnapshot {
            session: draft.with_id(id),
            attempts: Vec::new(),
        };
        Ok(SessionView::from_snapshot(snapshot, now))
    }

    /// Grade and record a guess.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Attempt` when the limit is reached, the session is closed or
    /// the attempt number was taken twice by concurrent submissions, and
    /// `GameError::Answer` for blank or oversized guesses.
    pub async fn submit_answer(
        &self,
        session_id: SessionId,
        raw_answer: &str,
    ) -> Result<SubmittedAttempt, GameError> {
        self.submit_answer_at(session_id, raw_answer, self.clock.now())
            .await
    }

    /// `submit_answer` at an explicit instant.
    ///
    /// # Errors
    ///
    /// See `submit_answer`.
    pub async fn submit_answer_at(
        &self,
        session_id: SessionId,
        raw_answer: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmittedAttempt, GameError> {
        let mut snapshot = self.sessions.load_session(session_id).await?;
        let question = self
            .catalog
            .get_question(snapshot.session.question_id())
            .await?;
        let answer = question.grade(raw_answer)?;

        let mut retried = false;
        let attempt = loop {
            let attempt = session_clock::append_attempt(
                &snapshot.session,
                &snapshot.attempts,
                answer.clone(),
                now,
            )?;
            match self.sessions.append_attempt(&attempt).await {
                Ok(()) => break attempt,
                Err(err) if err.is_sequence_conflict() && !retried => {
                    tracing::warn!(
                        session_id = session_id.value(),
                        number = attempt.number(),
                        "attempt number already taken, reloading once"
                    );
                    retried = true;
                    snapshot = self.sessions.load_session(session_id).await?;
                }
                Err(err) => return Err(err.into()),
            }
        };

        tracing::debug!(
            session_id = session_id.value(),
            number = attempt.number(),
            correct = attempt.is_correct(),
            "attempt recorded"
        );

        snapshot.attempts.push(attempt.clone());
        let finished = attempt.is_correct() || attempt.number() >= MAX_ATTEMPTS;
        let outcome = if finished && self.settings.auto_complete() {
            Some(self.finish(session_id, now).await?)
        } else {
            None
        };

        let status = outcome
            .as_ref()
            .map_or_else(|| snapshot.status(now), |o| o.status);
        let attempts_left = MAX_ATTEMPTS.saturating_sub(attempt.number());

        Ok(SubmittedAttempt {
            attempt,
            status,
            attempts_left,
            outcome,
        })
    }

    /// Stamp the session complete, score it and award experience on a win.
    ///
    /// # Errors
    ///
    /// Returns `GameError::AlreadyCompleted` on a second completion.
    pub async fn complete(&self, session_id: SessionId) -> Result<SessionOutcome, GameError> {
        self.complete_at(session_id, self.clock.now()).await
    }

    /// `complete` at an explicit instant.
    ///
    /// # Errors
    ///
    /// See `complete`.
    pub async fn complete_at(
        &self,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<SessionOutcome, GameError> {
        self.finish(session_id, now).await
    }

    async fn finish(
        &self,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<SessionOutcome, GameError> {
        let done = self.sessions.complete_session(session_id, now).await?;

        tracing::info!(
            session_id = session_id.value(),
            status = done.status.as_str(),
            score = done.snapshot.session.score(),
            xp_awarded = done.xp_awarded,
            "session completed"
        );

        Ok(SessionOutcome {
            session: done.snapshot.session,
            status: done.status,
            xp_awarded: done.xp_awarded,
            player_level: done.stats.player_level(),
            leveled_up: done.leveled_up,
        })
    }

    /// Current view of a session.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Storage` if the session does not exist.
    pub async fn status(&self, session_id: SessionId) -> Result<SessionView, GameError> {
        self.status_at(session_id, self.clock.now()).await
    }

    /// `status` at an explicit instant.
    ///
    /// # Errors
    ///
    /// See `status`.
    pub async fn status_at(
        &self,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<SessionView, GameError> {
        let snapshot = self.sessions.load_session(session_id).await?;
        Ok(SessionView::from_snapshot(snapshot, now))
    }

    /// The player's most recent sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Storage` on storage failures.
    pub async fn history(
        &self,
        player: PlayerId,
        limit: u32,
    ) -> Result<Vec<SessionView>, GameError> {
        let now = self.clock.now();
        let snapshots = self
            .sessions
            .list_sessions_for_player(player, limit)
            .await?;
        Ok(snapshots
            .into_iter()
            .map(|snapshot| SessionView::from_snapshot(snapshot, now))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Category, CategoryId, LocalizedText, Player, QuestionDraft};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn service(settings: GameSettings) -> (GameService, PlayerId, QuestionId) {
        let repo = InMemoryRepository::new();
        let category = Category::new(
            CategoryId::new(0),
            CategoryKind::JavaScript,
            LocalizedText::english("JavaScript programming"),
            "fa-brands fa-js",
            4,
        )
        .unwrap();
        repo.ensure_category(&category).await.unwrap();
        let question = QuestionDraft {
            category: CategoryKind::JavaScript,
            difficulty: Difficulty::Beginner,
            text: LocalizedText::english("What keyword declares a constant variable?"),
            code_snippet: Some("const PI = 3.14159;".into()),
            answer: "const".into(),
            hint: LocalizedText::english("Cannot be reassigned"),
            explanation: LocalizedText::default(),
        }
        .validate(QuestionId::new(0), fixed_now())
        .unwrap();
        let (qid, _) = repo.ensure_question(&question).await.unwrap();
        let player = Player::new(PlayerId::new(0), "linus", fixed_now()).unwrap();
        let (player, _) = repo.register_player(&player).await.unwrap();

        let svc = GameService::new(
            Clock::fixed(fixed_now()),
            settings,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo),
        );
        (svc, player.id(), qid)
    }

    #[tokio::test]
    async fn correct_guess_auto_completes_and_awards_xp() {
        let (svc, pid, qid) = service(GameSettings::default()).await;
        let view = svc.start_session(pid, qid).await.unwrap();
        assert_eq!(view.status, SessionStatus::InProgress);
        assert_eq!(view.remaining, Duration::seconds(60));

        let sid = view.session.id();
        let t = fixed_now();
        let miss = svc
            .submit_answer_at(sid, "let", t + Duration::seconds(10))
            .await
            .unwrap();
        assert_eq!(miss.status, SessionStatus::InProgress);
        assert_eq!(miss.attempts_left, 5);
        assert!(miss.outcome.is_none());

        let hit = svc
            .submit_answer_at(sid, "  CONST ", t + Duration::seconds(20))
            .await
            .unwrap();
        assert_eq!(hit.status, SessionStatus::Won);
        let outcome = hit.outcome.unwrap();
        assert_eq!(outcome.session.score(), 50);
        assert_eq!(outcome.xp_awarded, 50);
        assert_eq!(outcome.player_level, 1);

        let err = svc
            .submit_answer_at(sid, "const", t + Duration::seconds(21))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GameError::Attempt(quiz_core::model::AttemptError::SessionClosed { .. })
        ));
    }

    #[tokio::test]
    async fn manual_completion_after_deadline_is_abandoned() {
        let settings = GameSettings::new(60, false).unwrap();
        let (svc, pid, qid) = service(settings).await;
        let sid = svc.start_session(pid, qid).await.unwrap().session.id();
        let t = fixed_now();

        let hit = svc
            .submit_answer_at(sid, "const", t + Duration::seconds(40))
            .await
            .unwrap();
        assert!(hit.outcome.is_none());
        assert_eq!(hit.status, SessionStatus::InProgress);

        let outcome = svc
            .complete_at(sid, t + Duration::seconds(65))
            .await
            .unwrap();
        assert_eq!(outcome.status, SessionStatus::Abandoned);
        assert_eq!(outcome.xp_awarded, 0);

        let err = svc
            .complete_at(sid, t + Duration::seconds(70))
            .await
            .unwrap_err();
        match err {
            GameError::AlreadyCompleted(e) => {
                assert_eq!(e.completed_at, t + Duration::seconds(65));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_guesses_are_rejected_without_using_an_attempt() {
        let (svc, pid, qid) = service(GameSettings::default()).await;
        let sid = svc.start_session(pid, qid).await.unwrap().session.id();

        let err = svc.submit_answer(sid, "   ").await.unwrap_err();
        assert!(matches!(err, GameError::Answer(_)));
        assert!(svc.status(sid).await.unwrap().attempts.is_empty());
    }

    #[tokio::test]
    async fn random_session_with_no_match_reports_no_questions() {
        let (svc, pid, _) = service(GameSettings::default()).await;
        let err = svc
            .start_random_session(pid, Some(CategoryKind::Css), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::NoQuestions));

        let view = svc
            .start_random_session(pid, Some(CategoryKind::Random), Some(Difficulty::Beginner))
            .await
            .unwrap();
        assert_eq!(view.status, SessionStatus::InProgress);
    }
}
