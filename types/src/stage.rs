use crate::{FIRE_CLUE, SECRETS_CLUE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the final stage, solved through [crate::Player::complete].
pub const FINAL_STAGE: &str = "secrets";

/// An intermediate stage of the hunt.
///
/// Stages must be cleared in declaration order; the final stage is not a
/// variant because clearing it finishes the game rather than handing out
/// another clue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Age,
    Fire,
}

impl Stage {
    pub const ALL: [Stage; 2] = [Stage::Age, Stage::Fire];

    /// Progress a player must have reached for this stage to be accepted.
    pub fn expected_progress(self) -> u8 {
        match self {
            Stage::Age => 0,
            Stage::Fire => 1,
        }
    }

    /// Clue revealed once this stage is cleared.
    pub fn next_clue(self) -> &'static str {
        match self {
            Stage::Age => FIRE_CLUE,
            Stage::Fire => SECRETS_CLUE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Age => "age",
            Stage::Fire => "fire",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
