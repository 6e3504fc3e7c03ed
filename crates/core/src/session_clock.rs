//! Status derivation and the two session mutators.
//!
//! Status is a pure function of the session timestamps, its attempts and an injected
//! `now`. Nothing here reads the system clock.

use chrono::{DateTime, Utc};

use crate::model::{
    AlreadyCompletedError, Attempt, AttemptError, GameSession, MAX_ATTEMPTS, SessionStatus,
    SubmittedAnswer,
};

/// Points per attempt left unused when the first correct answer lands, counting that attempt.
pub const POINTS_PER_SPARE_ATTEMPT: i32 = 10;

/// Derive the current status of `session`.
///
/// Precedence:
/// 1. completed on time with a correct attempt: `Won`
/// 2. completed on time without one: `Lost`
/// 3. completed after `end_at`: `Abandoned`
/// 4. not completed and `now > end_at`: `Abandoned`
/// 5. otherwise `InProgress`
///
/// Only the completion timestamp decides on-time vs late; individual attempt
/// timestamps are not consulted.
#[must_use]
pub fn evaluate_status(
    session: &GameSession,
    attempts: &[Attempt],
    now: DateTime<Utc>,
) -> SessionStatus {
    match session.completed_at() {
        Some(completed_at) if completed_at <= session.end_at() => {
            if attempts.iter().any(Attempt::is_correct) {
                SessionStatus::Won
            } else {
                SessionStatus::Lost
            }
        }
        Some(_) => SessionStatus::Abandoned,
        None if now > session.end_at() => SessionStatus::Abandoned,
        None => SessionStatus::InProgress,
    }
}

/// Build the next attempt for `session`.
///
/// `attempts` must be the session's attempts ordered by number. Nothing is mutated; the
/// caller persists the returned attempt inside the same atomic unit that loaded `attempts`.
///
/// # Errors
///
/// - `AttemptLimitExceeded` if `MAX_ATTEMPTS` are already recorded (checked first).
/// - `SessionClosed` if the session is completed or not `InProgress` at `now`.
/// - `SequenceConflict` if the existing attempts are not numbered `1..=n` for this session.
pub fn append_attempt(
    session: &GameSession,
    attempts: &[Attempt],
    answer: SubmittedAnswer,
    now: DateTime<Utc>,
) -> Result<Attempt, AttemptError> {
    let count = u32::try_from(attempts.len()).unwrap_or(u32::MAX);
    if count >= MAX_ATTEMPTS {
        return Err(AttemptError::AttemptLimitExceeded {
            limit: MAX_ATTEMPTS,
        });
    }

    let status = evaluate_status(session, attempts, now);
    if session.is_completed() || status != SessionStatus::InProgress {
        return Err(AttemptError::SessionClosed { status });
    }

    let next = count + 1;
    let contiguous = attempts
        .iter()
        .zip(1..)
        .all(|(attempt, expected)| attempt.number() == expected && attempt.session_id() == session.id());
    if !contiguous {
        return Err(AttemptError::SequenceConflict { number: next });
    }

    Ok(Attempt::new_numbered(session.id(), next, answer, now))
}

/// Stamp `completed_at = now`. Does not decide the outcome.
///
/// # Errors
///
/// Returns `AlreadyCompletedError` if the session was completed before; the stored
/// timestamp is left unchanged.
pub fn complete_session(
    session: &mut GameSession,
    now: DateTime<Utc>,
) -> Result<(), AlreadyCompletedError> {
    session.stamp_completion(now, None)
}

/// Stamp `completed_at = now` and record `score` in the same step.
///
/// # Errors
///
/// Returns `AlreadyCompletedError` if the session was completed before; neither the
/// timestamp nor the score change.
pub fn complete_session_scored(
    session: &mut GameSession,
    now: DateTime<Utc>,
    score: i32,
) -> Result<(), AlreadyCompletedError> {
    session.stamp_completion(now, Some(score))
}

/// Score earned by a set of attempts: 10 points per unused attempt including the winning one,
/// zero without a correct attempt.
#[must_use]
pub fn score_for(attempts: &[Attempt]) -> i32 {
    attempts
        .iter()
        .filter(|a| a.is_correct())
        .map(Attempt::number)
        .min()
        .map_or(0, |first| {
            let spare = MAX_ATTEMPTS.saturating_sub(first) + 1;
            i32::try_from(spare).unwrap_or(0) * POINTS_PER_SPARE_ATTEMPT
        })
}
