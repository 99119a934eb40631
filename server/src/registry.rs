use chrono::{DateTime, Utc};
use riddle_types::{api::PlayerSnapshot, player_key, Error, Player, Result};
use std::collections::HashMap;

/// Registered players in registration order, indexed by canonical name.
#[derive(Default, Debug)]
pub struct Registry {
    players: Vec<Player>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new player unless the name is taken under any casing.
    pub fn register(&mut self, name: String, now: DateTime<Utc>) -> Result<&Player> {
        let key = player_key(&name);
        if self.index.contains_key(&key) {
            return Err(Error::DuplicatePlayer(name));
        }
        let position = self.players.len();
        self.players.push(Player::new(name, now));
        self.index.insert(key, position);
        Ok(&self.players[position])
    }

    pub fn find(&self, name: &str) -> Result<&Player> {
        let position = self.position(name)?;
        Ok(&self.players[position])
    }

    pub fn find_mut(&mut self, name: &str) -> Result<&mut Player> {
        let position = self.position(name)?;
        Ok(&mut self.players[position])
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.index
            .get(&player_key(name))
            .copied()
            .ok_or_else(|| Error::PlayerNotFound(name.to_string()))
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn list(&self) -> Vec<PlayerSnapshot> {
        self.players.iter().map(Player::snapshot).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
