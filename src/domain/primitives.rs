//! Domain primitives: PlayerId, Level.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Stable external identity of a player (platform user id).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl PlayerId {
    /// Create a PlayerId from the platform user id.
    pub fn new(id: i64) -> Self {
        PlayerId(id)
    }

    /// Get the underlying id value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(PlayerId)
    }
}

/// Player level, an index into the per-level rule tables.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Level(pub u8);

impl Level {
    pub const ZERO: Level = Level(0);

    /// Create a Level from its index.
    pub fn new(level: u8) -> Self {
        Level(level)
    }

    /// Index into per-level rule tables.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// The level directly above this one.
    pub fn next(&self) -> Level {
        Level(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lv{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(Level::new(0).to_string(), "lv0");
        assert_eq!(Level::new(5).to_string(), "lv5");
    }

    #[test]
    fn test_level_next_and_ordering() {
        let lv = Level::new(2);
        assert_eq!(lv.next(), Level::new(3));
        assert!(Level::ZERO < lv);
        assert_eq!(Level(u8::MAX).next(), Level(u8::MAX));
    }

    #[test]
    fn test_player_id_parse() {
        assert_eq!(PlayerId::from_str(" 42 ").unwrap(), PlayerId::new(42));
        assert!(PlayerId::from_str("abc").is_err());
    }

    #[test]
    fn test_player_id_serializes_transparently() {
        let json = serde_json::to_string(&PlayerId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
