use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    AlreadyCompletedError, Attempt, AttemptError, Category, CategoryId, CategoryKind, Difficulty,
    GameSession, Player, PlayerId, PlayerStats, Question, QuestionId, SessionId, SessionStatus,
    SubmittedAnswer, Trophy,
};
use quiz_core::session_clock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Attempt(#[from] AttemptError),

    #[error(transparent)]
    AlreadyCompleted(#[from] AlreadyCompletedError),
}

impl StorageError {
    /// True when a concurrent append claimed the attempt number first.
    #[must_use]
    pub fn is_sequence_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::Attempt(AttemptError::SequenceConflict { .. })
        )
    }
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// A session together with its attempts ordered by number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: GameSession,
    pub attempts: Vec<Attempt>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> SessionStatus {
        session_clock::evaluate_status(&self.session, &self.attempts, now)
    }
}

/// A session after completion, together with the experience it earned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub snapshot: SessionSnapshot,
    pub status: SessionStatus,
    pub xp_awarded: u32,
    pub stats: PlayerStats,
    pub leveled_up: bool,
}

/// Insert shape for a session; the id is assigned by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSessionRecord {
    pub player_id: PlayerId,
    pub question_id: QuestionId,
    pub started_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl NewSessionRecord {
    #[must_use]
    pub fn from_session(session: &GameSession) -> Self {
        Self {
            player_id: session.player_id(),
            question_id: session.question_id(),
            started_at: session.started_at(),
            end_at: session.end_at(),
        }
    }
}

/// Filter for question listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionFilter {
    /// `None` and `Some(CategoryKind::Random)` both mean every category.
    pub category: Option<CategoryKind>,
    pub difficulty: Option<Difficulty>,
    pub active_only: bool,
    pub limit: u32,
}

impl Default for QuestionFilter {
    fn default() -> Self {
        Self {
            category: None,
            difficulty: None,
            active_only: true,
            limit: 500,
        }
    }
}

impl QuestionFilter {
    fn concrete_category(&self) -> Option<CategoryKind> {
        self.category.filter(|c| !c.is_random())
    }

    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        self.concrete_category()
            .is_none_or(|c| question.category() == c)
            && self.difficulty.is_none_or(|d| question.difficulty() == d)
            && (!self.active_only || question.is_active())
    }
}

/// Re-run the append rules against freshly loaded state and make sure `attempt`
/// still carries the next free number.
pub(crate) fn recheck_append(
    snapshot: &SessionSnapshot,
    attempt: &Attempt,
) -> Result<(), StorageError> {
    let answer = SubmittedAnswer::new(attempt.answer(), attempt.is_correct());
    let expected = session_clock::append_attempt(
        &snapshot.session,
        &snapshot.attempts,
        answer,
        attempt.attempted_at(),
    )?;
    if expected.number() != attempt.number() || attempt.session_id() != snapshot.session.id() {
        return Err(AttemptError::SequenceConflict {
            number: attempt.number(),
        }
        .into());
    }
    Ok(())
}

/// Stamp `snapshot` complete and score it from the attempts it holds. Returns the
/// resulting status and the experience it is worth.
pub(crate) fn settle_completion(
    snapshot: &mut SessionSnapshot,
    completed_at: DateTime<Utc>,
) -> Result<(SessionStatus, u32), StorageError> {
    let score = session_clock::score_for(&snapshot.attempts);
    session_clock::complete_session_scored(&mut snapshot.session, completed_at, score)?;
    let status = snapshot.status(completed_at);
    let xp = if status == SessionStatus::Won {
        u32::try_from(snapshot.session.score()).unwrap_or(0)
    } else {
        0
    };
    Ok((status, xp))
}

//
// ─── TRAITS ────────────────────────────────────────────────────────────────────
//

/// Persistence for sessions and attempts. Mutations are atomic per session.
#[async_trait]
pub trait GameSessionRepository: Send + Sync {
    /// Insert a new session and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the player or question does not exist.
    async fn create_session(&self, record: NewSessionRecord) -> Result<SessionId, StorageError>;

    /// Load a session with its attempts ordered by number.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn load_session(&self, id: SessionId) -> Result<SessionSnapshot, StorageError>;

    /// Append an attempt. The limit and closed checks are re-evaluated against the stored
    /// state inside the same atomic unit as the insert.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Attempt` with `SequenceConflict` when the number was already
    /// claimed, or with the rule that rejected the attempt.
    async fn append_attempt(&self, attempt: &Attempt) -> Result<(), StorageError>;

    /// Stamp `completed_at` at most once. The score is computed from the attempts stored
    /// at that moment, and a win adds it to the player's experience, all in one atomic
    /// unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyCompleted` if the session was completed before, and
    /// `StorageError::NotFound` if the session or the player's statistics are missing.
    async fn complete_session(
        &self,
        id: SessionId,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionRecord, StorageError>;

    /// Most recent sessions of a player, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_sessions_for_player(
        &self,
        player_id: PlayerId,
        limit: u32,
    ) -> Result<Vec<SessionSnapshot>, StorageError>;
}

/// Categories and questions.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert the category unless one with the same kind exists.
    /// Returns the id and whether it was created.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn ensure_category(&self, category: &Category)
    -> Result<(CategoryId, bool), StorageError>;

    /// Categories ordered by display order, then code.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_categories(&self) -> Result<Vec<Category>, StorageError>;

    /// Insert the question unless one with the same category, difficulty, answer and
    /// English text exists. Returns the id and whether it was created.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if its category does not exist.
    async fn ensure_question(&self, question: &Question)
    -> Result<(QuestionId, bool), StorageError>;

    /// Update an existing question in place.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn update_question(&self, question: &Question) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError>;

    /// Questions matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_questions(&self, filter: QuestionFilter) -> Result<Vec<Question>, StorageError>;

    /// Delete all questions (and their sessions), categories and trophies.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn clear_catalog(&self) -> Result<(), StorageError>;
}

/// Players and their statistics.
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Insert the player and its initial statistics in one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either record cannot be stored; nothing is stored then.
    async fn register_player(&self, player: &Player)
    -> Result<(Player, PlayerStats), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the player does not exist.
    async fn get_player(&self, id: PlayerId) -> Result<Player, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the player does not exist.
    async fn get_stats(&self, id: PlayerId) -> Result<PlayerStats, StorageError>;

}

/// Trophy catalog.
#[async_trait]
pub trait TrophyRepository: Send + Sync {
    /// Insert the trophy unless its code exists. Returns whether it was created.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn ensure_trophy(&self, trophy: &Trophy) -> Result<bool, StorageError>;

    /// Trophies ordered by English name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_trophies(&self) -> Result<Vec<Trophy>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tables {
    next_session: u64,
    next_category: u64,
    next_question: u64,
    next_player: u64,
    sessions: BTreeMap<SessionId, GameSession>,
    attempts: HashMap<SessionId, Vec<Attempt>>,
    categories: HashMap<CategoryKind, Category>,
    questions: BTreeMap<QuestionId, Question>,
    players: HashMap<PlayerId, Player>,
    stats: HashMap<PlayerId, PlayerStats>,
    trophies: BTreeMap<String, Trophy>,
}

impl Tables {
    fn snapshot(&self, id: SessionId) -> Result<SessionSnapshot, StorageError> {
        let session = self.sessions.get(&id).cloned().ok_or(StorageError::NotFound)?;
        let attempts = self.attempts.get(&id).cloned().unwrap_or_default();
        Ok(SessionSnapshot { session, attempts })
    }
}

/// In-memory repository for tests and prototyping. One lock guards every table, so each
/// call is atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[async_trait]
impl GameSessionRepository for InMemoryRepository {
    async fn create_session(&self, record: NewSessionRecord) -> Result<SessionId, StorageError> {
        let mut t = self.lock()?;
        if !t.players.contains_key(&record.player_id) || !t.questions.contains_key(&record.question_id)
        {
            return Err(StorageError::Conflict);
        }
        let id = SessionId::new(next_id(&mut t.next_session));
        let session = GameSession::from_persisted(
            id,
            record.player_id,
            record.question_id,
            record.started_at,
            record.end_at,
            None,
            0,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        t.sessions.insert(id, session);
        t.attempts.insert(id, Vec::new());
        Ok(id)
    }

    async fn load_session(&self, id: SessionId) -> Result<SessionSnapshot, StorageError> {
        self.lock()?.snapshot(id)
    }

    async fn append_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        let snapshot = t.snapshot(attempt.session_id())?;
        recheck_append(&snapshot, attempt)?;
        t.attempts
            .entry(attempt.session_id())
            .or_default()
            .push(attempt.clone());
        Ok(())
    }

    async fn complete_session(
        &self,
        id: SessionId,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionRecord, StorageError> {
        let mut t = self.lock()?;
        let mut snapshot = t.snapshot(id)?;
        let mut stats = t
            .stats
            .get(&snapshot.session.player_id())
            .cloned()
            .ok_or(StorageError::NotFound)?;

        let (status, xp_awarded) = settle_completion(&mut snapshot, completed_at)?;
        let leveled_up = xp_awarded > 0 && stats.award(xp_awarded, completed_at);

        t.sessions.insert(id, snapshot.session.clone());
        t.stats.insert(stats.player_id(), stats.clone());
        Ok(CompletionRecord {
            snapshot,
            status,
            xp_awarded,
            stats,
            leveled_up,
        })
    }

    async fn list_sessions_for_player(
        &self,
        player_id: PlayerId,
        limit: u32,
    ) -> Result<Vec<SessionSnapshot>, StorageError> {
        let t = self.lock()?;
        let mut sessions: Vec<&GameSession> = t
            .sessions
            .values()
            .filter(|s| s.player_id() == player_id)
            .collect();
        sessions.sort_by(|a, b| {
            b.started_at()
                .cmp(&a.started_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        sessions
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|s| t.snapshot(s.id()))
            .collect()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn ensure_category(
        &self,
        category: &Category,
    ) -> Result<(CategoryId, bool), StorageError> {
        let mut t = self.lock()?;
        if let Some(existing) = t.categories.get(&category.kind()) {
            return Ok((existing.id(), false));
        }
        let id = CategoryId::new(next_id(&mut t.next_category));
        let stored = Category::new(
            id,
            category.kind(),
            category.description().clone(),
            category.icon_class(),
            category.order(),
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        t.categories.insert(category.kind(), stored);
        Ok((id, true))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let t = self.lock()?;
        let mut out: Vec<Category> = t.categories.values().cloned().collect();
        out.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(out)
    }

    async fn ensure_question(
        &self,
        question: &Question,
    ) -> Result<(QuestionId, bool), StorageError> {
        let mut t = self.lock()?;
        if !t.categories.contains_key(&question.category()) {
            return Err(StorageError::Conflict);
        }
        let existing = t.questions.values().find(|q| {
            q.category() == question.category()
                && q.difficulty() == question.difficulty()
                && q.answer() == question.answer()
                && q.text().en == question.text().en
        });
        if let Some(existing) = existing {
            return Ok((existing.id(), false));
        }
        let id = QuestionId::new(next_id(&mut t.next_question));
        let stored = with_question_id(question, id)?;
        t.questions.insert(id, stored);
        Ok((id, true))
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        let slot = t
            .questions
            .get_mut(&question.id())
            .ok_or(StorageError::NotFound)?;
        *slot = question.clone();
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        self.lock()?
            .questions
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_questions(&self, filter: QuestionFilter) -> Result<Vec<Question>, StorageError> {
        let t = self.lock()?;
        let mut out: Vec<Question> = t
            .questions
            .values()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        out.truncate(usize::try_from(filter.limit).unwrap_or(usize::MAX));
        Ok(out)
    }

    async fn clear_catalog(&self) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        let Tables {
            sessions,
            attempts,
            questions,
            categories,
            trophies,
            ..
        } = &mut *t;
        sessions.retain(|_, s| !questions.contains_key(&s.question_id()));
        attempts.retain(|id, _| sessions.contains_key(id));
        questions.clear();
        categories.clear();
        trophies.clear();
        Ok(())
    }
}

fn with_question_id(question: &Question, id: QuestionId) -> Result<Question, StorageError> {
    Question::from_persisted(
        id,
        question.category(),
        question.difficulty(),
        question.text().clone(),
        question.code_snippet().map(str::to_owned),
        question.answer().to_owned(),
        question.hint().clone(),
        question.explanation().clone(),
        question.is_active(),
        question.created_at(),
        question.updated_at(),
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

#[async_trait]
impl PlayerRepository for InMemoryRepository {
    async fn register_player(
        &self,
        player: &Player,
    ) -> Result<(Player, PlayerStats), StorageError> {
        let mut t = self.lock()?;
        let id = PlayerId::new(next_id(&mut t.next_player));
        let player = player.clone().with_id(id);
        let stats = player.initial_stats();
        t.players.insert(id, player.clone());
        t.stats.insert(id, stats.clone());
        Ok((player, stats))
    }

    async fn get_player(&self, id: PlayerId) -> Result<Player, StorageError> {
        self.lock()?
            .players
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn get_stats(&self, id: PlayerId) -> Result<PlayerStats, StorageError> {
        self.lock()?
            .stats
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

}

#[async_trait]
impl TrophyRepository for InMemoryRepository {
    async fn ensure_trophy(&self, trophy: &Trophy) -> Result<bool, StorageError> {
        let mut t = self.lock()?;
        if t.trophies.contains_key(trophy.code()) {
            return Ok(false);
        }
        t.trophies.insert(trophy.code().to_owned(), trophy.clone());
        Ok(true)
    }

    async fn list_trophies(&self) -> Result<Vec<Trophy>, StorageError> {
        let t = self.lock()?;
        let mut out: Vec<Trophy> = t.trophies.values().cloned().collect();
        out.sort_by(|a, b| a.name().en.cmp(&b.name().en));
        Ok(out)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn GameSessionRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub players: Arc<dyn PlayerRepository>,
    pub trophies: Arc<dyn TrophyRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            sessions: Arc::new(repo.clone()),
            catalog: Arc::new(repo.clone()),
            players: Arc::new(repo.clone()),
            trophies: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{LocalizedText, QuestionDraft};
    use quiz_core::time::fixed_now;

    async fn seeded() -> (InMemoryRepository, PlayerId, QuestionId) {
        let repo = InMemoryRepository::new();
        let category = Category::new(
            CategoryId::new(0),
            CategoryKind::Python,
            LocalizedText::english("Python"),
            "fa-brands fa-python",
            2,
        )
        .unwrap();
        repo.ensure_category(&category).await.unwrap();
        let question = QuestionDraft {
            category: CategoryKind::Python,
            difficulty: Difficulty::Beginner,
            text: LocalizedText::english("What keyword defines a function?"),
            code_snippet: None,
            answer: "def".into(),
            hint: LocalizedText::default(),
            explanation: LocalizedText::default(),
        }
        .validate(QuestionId::new(0), fixed_now())
        .unwrap();
        let (qid, _) = repo.ensure_question(&question).await.unwrap();
        let player = Player::new(PlayerId::new(0), "ada", fixed_now()).unwrap();
        let (player, _) = repo.register_player(&player).await.unwrap();
        (repo, player.id(), qid)
    }

    async fn open_session(repo: &InMemoryRepository, pid: PlayerId, qid: QuestionId) -> SessionId {
        let draft = GameSession::start(
            SessionId::new(0),
            pid,
            qid,
            fixed_now(),
            Duration::seconds(60),
        )
        .unwrap();
        repo.create_session(NewSessionRecord::from_session(&draft))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn stale_attempt_number_is_a_sequence_conflict() {
        let (repo, pid, qid) = seeded().await;
        let sid = open_session(&repo, pid, qid).await;
        let snapshot = repo.load_session(sid).await.unwrap();

        let first = session_clock::append_attempt(
            &snapshot.session,
            &snapshot.attempts,
            SubmittedAnswer::new("fn", false),
            fixed_now(),
        )
        .unwrap();
        let racer = first.clone();

        repo.append_attempt(&first).await.unwrap();
        let err = repo.append_attempt(&racer).await.unwrap_err();
        assert!(err.is_sequence_conflict());
        assert_eq!(repo.load_session(sid).await.unwrap().attempts.len(), 1);
    }

    async fn record(repo: &InMemoryRepository, sid: SessionId, guess: &str, correct: bool) {
        let snapshot = repo.load_session(sid).await.unwrap();
        let attempt = session_clock::append_attempt(
            &snapshot.session,
            &snapshot.attempts,
            SubmittedAnswer::new(guess, correct),
            fixed_now() + Duration::seconds(1),
        )
        .unwrap();
        repo.append_attempt(&attempt).await.unwrap();
    }

    #[tokio::test]
    async fn completion_is_stamped_once() {
        let (repo, pid, qid) = seeded().await;
        let sid = open_session(&repo, pid, qid).await;
        record(&repo, sid, "def", true).await;

        let at = fixed_now() + Duration::seconds(5);
        let done = repo.complete_session(sid, at).await.unwrap();
        assert_eq!(done.snapshot.session.completed_at(), Some(at));
        assert_eq!(done.status, SessionStatus::Won);

        let err = repo
            .complete_session(sid, at + Duration::seconds(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyCompleted(_)));
        let stored = repo.load_session(sid).await.unwrap().session;
        assert_eq!(stored.completed_at(), Some(at));
        assert_eq!(stored.score(), 60);
        assert_eq!(repo.get_stats(pid).await.unwrap().experience_points(), 60);
    }

    #[tokio::test]
    async fn completion_scores_the_attempts_stored_at_that_moment() {
        let (repo, pid, qid) = seeded().await;
        let sid = open_session(&repo, pid, qid).await;
        record(&repo, sid, "fn", false).await;
        record(&repo, sid, "def", true).await;

        let done = repo
            .complete_session(sid, fixed_now() + Duration::seconds(9))
            .await
            .unwrap();
        assert_eq!(done.snapshot.attempts.len(), 2);
        assert_eq!(done.snapshot.session.score(), 50);
        assert_eq!(done.xp_awarded, 50);
        assert_eq!(done.stats.experience_points(), 50);
    }

    #[tokio::test]
    async fn late_completion_awards_nothing() {
        let (repo, pid, qid) = seeded().await;
        let sid = open_session(&repo, pid, qid).await;
        record(&repo, sid, "def", true).await;

        let done = repo
            .complete_session(sid, fixed_now() + Duration::seconds(61))
            .await
            .unwrap();
        assert_eq!(done.status, SessionStatus::Abandoned);
        assert_eq!(done.xp_awarded, 0);
        assert!(!done.leveled_up);
        assert_eq!(repo.get_stats(pid).await.unwrap().experience_points(), 0);
    }

    #[tokio::test]
    async fn unknown_player_cannot_open_a_session() {
        let (repo, _pid, qid) = seeded().await;
        let record = NewSessionRecord {
            player_id: PlayerId::new(99),
            question_id: qid,
            started_at: fixed_now(),
            end_at: fixed_now() + Duration::seconds(60),
        };
        let err = repo.create_session(record).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn ensure_question_is_idempotent() {
        let (repo, _pid, qid) = seeded().await;
        let question = repo.get_question(qid).await.unwrap();
        let (again, created) = repo.ensure_question(&question).await.unwrap();
        assert_eq!(again, qid);
        assert!(!created);
    }

    #[test]
    fn random_filter_matches_every_category() {
        let question = QuestionDraft {
            category: CategoryKind::Css,
            difficulty: Difficulty::Advanced,
            text: LocalizedText::english("?"),
            code_snippet: None,
            answer: "color".into(),
            hint: LocalizedText::default(),
            explanation: LocalizedText::default(),
        }
        .validate(QuestionId::new(1), fixed_now())
        .unwrap();
        let filter = QuestionFilter {
            category: Some(CategoryKind::Random),
            ..QuestionFilter::default()
        };
        assert!(filter.matches(&question));
        let filter = QuestionFilter {
            category: Some(CategoryKind::Html),
            ..QuestionFilter::default()
        };
        assert!(!filter.matches(&question));
    }
}
