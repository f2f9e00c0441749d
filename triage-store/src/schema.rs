//! Database schema definitions for the pattern store.

/// SQL to create the `pattern_observations` table.
pub const CREATE_PATTERN_OBSERVATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS pattern_observations (
    id TEXT PRIMARY KEY NOT NULL,
    agent_id TEXT NOT NULL,
    type TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    data_json TEXT NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
)
"#;

/// SQL to create the `patterns` table.
pub const CREATE_PATTERNS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS patterns (
    id TEXT PRIMARY KEY NOT NULL,
    agent_id TEXT NOT NULL,
    type TEXT NOT NULL,
    description TEXT NOT NULL,
    confidence REAL NOT NULL,
    observation_count INTEGER NOT NULL,
    first_observed INTEGER NOT NULL,
    last_observed INTEGER NOT NULL,
    active INTEGER NOT NULL,
    linked_reminder_id TEXT,
    data_json TEXT NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
)
"#;

/// Index on `pattern_observations` by agent, for cross-agent-scoped scans.
pub const CREATE_OBSERVATIONS_AGENT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_pattern_observations_agent
ON pattern_observations(agent_id)
"#;

/// Index on `pattern_observations` by type, for the batch detector's
/// per-type clustering passes.
pub const CREATE_OBSERVATIONS_TYPE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_pattern_observations_type
ON pattern_observations(type)
"#;

/// Index on `pattern_observations` by timestamp, for window queries.
pub const CREATE_OBSERVATIONS_TIMESTAMP_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_pattern_observations_timestamp
ON pattern_observations(timestamp)
"#;

/// Index on `patterns` by agent.
pub const CREATE_PATTERNS_AGENT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_patterns_agent
ON patterns(agent_id)
"#;

/// Index on `patterns` by active flag, for the "active patterns only" read path.
pub const CREATE_PATTERNS_ACTIVE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_patterns_active
ON patterns(active)
"#;

/// Index on `patterns` by confidence, for the truncate-to-top-N merge path.
pub const CREATE_PATTERNS_CONFIDENCE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_patterns_confidence
ON patterns(confidence DESC)
"#;

/// All schema statements, in dependency order. Executed once per store
/// construction; every statement is idempotent (`IF NOT EXISTS`).
pub const ALL_STATEMENTS: &[&str] = &[
    CREATE_PATTERN_OBSERVATIONS_TABLE,
    CREATE_PATTERNS_TABLE,
    CREATE_OBSERVATIONS_AGENT_INDEX,
    CREATE_OBSERVATIONS_TYPE_INDEX,
    CREATE_OBSERVATIONS_TIMESTAMP_INDEX,
    CREATE_PATTERNS_AGENT_INDEX,
    CREATE_PATTERNS_ACTIVE_INDEX,
    CREATE_PATTERNS_CONFIDENCE_INDEX,
];
