//! Read-only leaderboard views. Never persisted.

use super::primitives::{Level, PlayerId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One ranked display row. `rank == 0` means "unknown / outside this page".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    #[serde(skip)]
    pub player_id: PlayerId,
    pub nickname: String,
    pub level: Level,
    pub is_premium: bool,
    pub points: i64,
    pub rank: u64,
}

/// A referee as shown on the referrer's friends list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub nickname: Option<String>,
    pub level: Level,
    pub is_premium: bool,
    /// Referral points this friend has earned the requester so far.
    pub points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardTab {
    Friends,
    Level,
    Global,
}

impl FromStr for LeaderboardTab {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "friends" => Ok(LeaderboardTab::Friends),
            "level" => Ok(LeaderboardTab::Level),
            "global" => Ok(LeaderboardTab::Global),
            _ => Err(()),
        }
    }
}

/// A leaderboard read: the requester's row, the page and the scope total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    pub me: LeaderboardRow,
    pub list: Vec<LeaderboardRow>,
    pub total: i64,
}
