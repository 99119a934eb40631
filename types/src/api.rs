use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of every request that targets a single player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRequest {
    pub name: String,
}

/// Clue returned on registration and on every intermediate stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub clue: String,
}

impl From<&str> for Clue {
    fn from(clue: &str) -> Self {
        Self {
            clue: clue.to_string(),
        }
    }
}

/// Result of clearing the final stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub message: String,
    pub completion_time_seconds: f64,
    pub completed_at: DateTime<Utc>,
}

/// Point-in-time view of a player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub joined: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub ended: Option<DateTime<Utc>>,
    pub progress: u8,
    pub completed: bool,
    /// Present only once the player has finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time_seconds: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub completion_time_seconds: f64,
    pub time_formatted: String,
    pub completed_at: DateTime<Utc>,
}

/// Completed players ranked by completion time, fastest first.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total_completed: usize,
    pub total_players: usize,
}

/// Aggregate counters over every registered player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_players: usize,
    pub completed_players: usize,
    pub active_players: usize,
    pub completion_rate: String,
    pub average_completion_time: Option<f64>,
    pub fastest_completion_time: Option<f64>,
}

/// Body of every rejected request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
