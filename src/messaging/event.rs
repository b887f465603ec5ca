use crate::types::constants::{inbound_events, outbound_events};
use serde::{Deserialize, Serialize};

/// Events the client emits over the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundEvent {
    /// Presence announcement sent right after connecting
    Connection,
    ChallengeProgress,
    ChallengeCompletion,
    LearningProgress,
    AchievementUnlocked,
}

impl OutboundEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => outbound_events::CONNECTION,
            Self::ChallengeProgress => outbound_events::CHALLENGE_PROGRESS,
            Self::ChallengeCompletion => outbound_events::CHALLENGE_COMPLETION,
            Self::LearningProgress => outbound_events::LEARNING_PROGRESS,
            Self::AchievementUnlocked => outbound_events::ACHIEVEMENT_UNLOCKED,
        }
    }
}

impl std::fmt::Display for OutboundEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events the backend pushes to the client.
///
/// Unrecognized type strings map to [`InboundEvent::Unknown`] so a newer
/// backend never breaks an older client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InboundEvent {
    ProgressUpdate,
    LeaderboardUpdate,
    AchievementUnlocked,
    LiveStats,
    ChallengeCompletion,
    /// Forward-compatible catch-all; logged and ignored by the dispatcher
    Unknown(String),
}

impl InboundEvent {
    /// Parse a wire `type` discriminator into an InboundEvent
    pub fn from_str(s: &str) -> Self {
        match s {
            inbound_events::PROGRESS_UPDATE => Self::ProgressUpdate,
            inbound_events::LEADERBOARD_UPDATE => Self::LeaderboardUpdate,
            inbound_events::ACHIEVEMENT_UNLOCKED => Self::AchievementUnlocked,
            inbound_events::LIVE_STATS => Self::LiveStats,
            inbound_events::CHALLENGE_COMPLETION => Self::ChallengeCompletion,
            _ => Self::Unknown(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ProgressUpdate => inbound_events::PROGRESS_UPDATE,
            Self::LeaderboardUpdate => inbound_events::LEADERBOARD_UPDATE,
            Self::AchievementUnlocked => inbound_events::ACHIEVEMENT_UNLOCKED,
            Self::LiveStats => inbound_events::LIVE_STATS,
            Self::ChallengeCompletion => inbound_events::CHALLENGE_COMPLETION,
            Self::Unknown(s) => s,
        }
    }
}

impl From<&str> for InboundEvent {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl std::fmt::Display for InboundEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
