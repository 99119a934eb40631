/// Number of stages a player must clear to finish the hunt (age, fire, secrets).
pub const STAGE_COUNT: u8 = 3;

/// Progress a player must have reached before the final stage is accepted.
pub const FINAL_STAGE_PROGRESS: u8 = STAGE_COUNT - 1;

/// Clue handed out on registration (answer: age).
pub const FIRST_CLUE: &str = "I go up but never come down, though I have no legs to walk around.";

/// Clue handed out after the age stage (answer: fire).
pub const FIRE_CLUE: &str =
    "I eat all I’m given, no teeth in sight, the more I eat, the bigger and bright.";

/// Clue handed out after the fire stage (answer: secrets).
pub const SECRETS_CLUE: &str =
    "The more you share me, the less I stay, but I can still make your friend’s day.";

/// Message returned once the final stage is solved.
pub const WIN_MESSAGE: &str = "Congratulations! You solved every riddle.";
