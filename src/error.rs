use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `chatkeeper`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum KeeperError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Chat service / bridge ────────────────────────────────────────────
    #[error("bridge: {0}")]
    Bridge(#[from] BridgeError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Chat-service bridge errors ──────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to spawn bridge command {command}: {message}")]
    Spawn { command: String, message: String },

    #[error("bridge closed before replying to {op}")]
    Closed { op: String },

    #[error("bridge rejected {op}: {message}")]
    Rejected { op: String, message: String },

    #[error("malformed bridge reply to {op}: {message}")]
    Protocol { op: String, message: String },
}

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, KeeperError>;
