use serde::{Deserialize, Serialize};

/// Business result carried by every response envelope.
///
/// `ok=false` is an expected outcome, not an error: the reason is a stable
/// machine-readable code and the message a human-readable echo of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BizResult {
    pub ok: bool,
    pub reason: String,
    pub message: String,
}

impl BizResult {
    pub fn ok() -> Self {
        Self {
            ok: true,
            reason: String::new(),
            message: String::new(),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            ok: false,
            message: reason.clone(),
            reason,
        }
    }
}

/// Stable reason codes the core produces. Kept as constants so tests and the
/// gate's protocol translation agree on the exact strings.
pub mod reason {
    pub const NIL_REQUEST: &str = "nil request";
    pub const INVALID_SEQ: &str = "invalid seq";
    pub const DUPLICATE_SEQ: &str = "duplicate seq";
    pub const PLAYER_LOADING: &str = "player loading";
    pub const WORLD_NOT_ONLINE: &str = "world not online";
    pub const EMPTY_REQUEST_BODY: &str = "empty request body";
    pub const NO_HANDLER: &str = "no handler for request body";
    pub const BODY_TYPE_MISMATCH: &str = "request body type mismatch";
    pub const INVALID_PLAYER_ID: &str = "invalid player_id";
    pub const INVALID_WORLD_ID: &str = "invalid world_id";
}
