use chrono::{DateTime, Utc};

use crate::{
    api::{Completion, PlayerSnapshot},
    Error, Result, Stage, FINAL_STAGE, FINAL_STAGE_PROGRESS, STAGE_COUNT, WIN_MESSAGE,
};

/// Canonical lookup key for a player name.
pub fn player_key(name: &str) -> String {
    name.to_lowercase()
}

/// Seconds elapsed between two timestamps, at millisecond resolution.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}

/// A participant in the hunt.
///
/// Completion is tracked solely through `ended`: a player is completed iff
/// it carries an end timestamp, which is only ever set together with
/// `progress = STAGE_COUNT`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    name: String,
    key: String,
    joined: DateTime<Utc>,
    last_update: DateTime<Utc>,
    ended: Option<DateTime<Utc>>,
    progress: u8,
}

impl Player {
    pub fn new(name: String, now: DateTime<Utc>) -> Self {
        let key = player_key(&name);
        Self {
            name,
            key,
            joined: now,
            last_update: now,
            ended: None,
            progress: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn joined(&self) -> DateTime<Utc> {
        self.joined
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn ended(&self) -> Option<DateTime<Utc>> {
        self.ended
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_completed(&self) -> bool {
        self.ended.is_some()
    }

    /// Time taken to finish the hunt, if finished.
    pub fn completion_time_seconds(&self) -> Option<f64> {
        self.ended.map(|ended| elapsed_seconds(self.joined, ended))
    }

    /// Clears an intermediate stage and returns the next clue.
    pub fn advance(&mut self, stage: Stage, now: DateTime<Utc>) -> Result<&'static str> {
        let expected = stage.expected_progress();
        if self.progress != expected {
            return Err(Error::WrongStage {
                stage: stage.as_str(),
                expected,
                actual: self.progress,
            });
        }
        self.progress += 1;
        self.last_update = now;
        Ok(stage.next_clue())
    }

    /// Clears the final stage.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<Completion> {
        if self.is_completed() {
            return Err(Error::AlreadyCompleted(self.name.clone()));
        }
        if self.progress != FINAL_STAGE_PROGRESS {
            return Err(Error::WrongStage {
                stage: FINAL_STAGE,
                expected: FINAL_STAGE_PROGRESS,
                actual: self.progress,
            });
        }
        self.progress = STAGE_COUNT;
        self.ended = Some(now);
        self.last_update = now;
        Ok(Completion {
            message: WIN_MESSAGE.to_string(),
            completion_time_seconds: elapsed_seconds(self.joined, now),
            completed_at: now,
        })
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            name: self.name.clone(),
            joined: self.joined,
            last_update: self.last_update,
            ended: self.ended,
            progress: self.progress,
            completed: self.is_completed(),
            completion_time_seconds: self.completion_time_seconds(),
        }
    }
}
