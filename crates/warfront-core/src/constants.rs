//! Engine constants and tuning defaults.
//!
//! Map tables may override every value here; these are the defaults used
//! when a table leaves a field out.

// --- Capture windows ---

/// Default assault window for bases and graveyards (ms).
pub const DEFAULT_CAPTURE_MS: u64 = 60_000;

/// Default time a dropped flag lies on the ground before it despawns (ms).
pub const DEFAULT_FLAG_DROP_MS: u64 = 10_000;

/// Default time a flag takes to reappear on its stand (ms).
pub const DEFAULT_FLAG_RESPAWN_MS: u64 = 23_000;

// --- Progress capture ---

/// Capture bar range is `[-PROGRESS_LIMIT, PROGRESS_LIMIT]`; positive favours team A.
pub const PROGRESS_LIMIT: i32 = 100;

/// Bar value at which a team takes control.
pub const PROGRESS_CAPTURE_THRESHOLD: i32 = 30;

/// Bar points moved per second for each player of advantage.
pub const PROGRESS_POINTS_PER_PLAYER_SEC: u32 = 4;

/// Player advantage beyond this count does not speed up the bar.
pub const PROGRESS_MAX_PLAYER_ADVANTAGE: u32 = 5;

// --- Schedule ---

/// Default warmup (doors closed) length (ms).
pub const DEFAULT_WARMUP_MS: u64 = 120_000;

/// Default warmup announcements, as time remaining before the doors open (ms).
pub const DEFAULT_ANNOUNCEMENTS_MS: [u64; 2] = [60_000, 30_000];

// --- Elimination ---

/// Pool loss per player death when a map does not specify one.
pub const DEFAULT_PLAYER_KILL_PENALTY: u32 = 1;
