/// Outbound event strings (magic strings layer)
pub mod outbound_events {
    pub const CONNECTION: &str = "connection";
    pub const CHALLENGE_PROGRESS: &str = "challenge_progress";
    pub const CHALLENGE_COMPLETION: &str = "challenge_completion";
    pub const LEARNING_PROGRESS: &str = "learning_progress";
    pub const ACHIEVEMENT_UNLOCKED: &str = "achievement_unlocked";
}

/// Inbound event strings (magic strings layer)
pub mod inbound_events {
    pub const PROGRESS_UPDATE: &str = "progress_update";
    pub const LEADERBOARD_UPDATE: &str = "leaderboard_update";
    pub const ACHIEVEMENT_UNLOCKED: &str = "achievement_unlocked";
    pub const LIVE_STATS: &str = "live_stats";
    pub const CHALLENGE_COMPLETION: &str = "challenge_completion";
}

/// Keys under which local state is persisted
pub mod storage_keys {
    pub const PENDING_QUEUE: &str = "pending_messages";
    pub const USER_ID: &str = "user_id";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const PROGRESS_CACHE: &str = "progress_cache";
}

/// Path component of the realtime channel endpoint
pub const CHANNEL_PATH: &str = "/ws/progress";

/// Base reconnect delay (milliseconds); attempt k waits base * 2^(k-1)
pub const BASE_RECONNECT_DELAY_MS: u64 = 1000;

/// Automatic reconnect attempts before giving up (OfflineFallback)
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Max pending messages retained while offline; oldest are evicted beyond this
pub const MAX_PENDING_MESSAGES: usize = 1000;
