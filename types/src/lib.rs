//! Player state machine, leaderboard computation and the JSON records
//! exchanged between the riddle-hunt server and its clients.

pub mod api;
mod constants;
mod error;
mod leaderboard;
mod player;
mod stage;

pub use constants::*;
pub use error::{Error, Result};
pub use leaderboard::{format_elapsed, leaderboard, stats};
pub use player::{elapsed_seconds, player_key, Player};
pub use stage::{Stage, FINAL_STAGE};
