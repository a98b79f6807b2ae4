// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "conclave.db";
pub const DEFAULT_WAL_MODE: bool = true;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// --- Retrieval ---
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 10;
pub const DEFAULT_CANDIDATE_POOL_SIZE: usize = 200;
pub const DEFAULT_CONTEXTUAL_WEIGHT: f64 = 0.30;
pub const DEFAULT_SIMILARITY_WEIGHT: f64 = 0.25;
pub const DEFAULT_PATTERN_WEIGHT: f64 = 0.25;
pub const DEFAULT_CONTENT_WEIGHT: f64 = 0.20;
pub const DEFAULT_SIMILARITY_MIN: f64 = 0.6;
pub const DEFAULT_CONFIDENCE_INFLUENCE: f64 = 0.5;
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.0;
pub const DEFAULT_STORE_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_STORE_RETRY_DELAY_MS: u64 = 50;

// --- Confidence ---
pub const DEFAULT_NEUTRAL_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_PRIOR_STRENGTH: f64 = 2.0;
pub const DEFAULT_CORRECT_ACCURACY_WEIGHT: f64 = 1.0;
pub const DEFAULT_INCORRECT_ACCURACY_WEIGHT: f64 = 0.25;

// --- Strategy ---
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_SMART_CONCURRENCY: usize = 2;
pub const DEFAULT_SMART_MAX_AGENTS: usize = 4;
pub const DEFAULT_FOCUSED_FALLBACK_COUNT: usize = 2;
pub const DEFAULT_LARGE_INPUT_BYTES: u64 = 200_000;
pub const DEFAULT_LARGE_INPUT_LINES: u64 = 5_000;

// --- Dispatch ---
pub const DEFAULT_DISPATCH_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_RETRY_JITTER_FACTOR: f64 = 0.2;

// --- Rate limiting ---
pub const DEFAULT_RATE_LIMIT_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RATE_LIMIT_MAX_DELAY_MS: u64 = 60_000;
pub const DEFAULT_RATE_LIMIT_JITTER_FACTOR: f64 = 0.2;
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 1;

// --- Session state ---
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3_600;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;
pub const DEFAULT_STATE_WRITE_ATTEMPTS: u32 = 3;
pub const DEFAULT_STATE_WRITE_DELAY_MS: u64 = 25;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = true;
