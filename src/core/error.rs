use thiserror::Error;

/// Crate-wide error model.
///
/// The variants are the closed set of outcomes the runtime distinguishes:
/// expected business rejections travel inside response envelopes, infra
/// failures carry their operation name and cause for the boundary log, and
/// the remaining variants cover parameter validation and actor transport.
#[derive(Error, Debug)]
pub enum GameError {
    /// Expected business outcome (duplicate seq, entity not online, ...).
    /// Surfaced as `ok=false` in the response envelope, never logged at ERROR.
    #[error("{reason}: {message}")]
    Biz { reason: String, message: String },

    /// Repository or other infrastructure failure.
    #[error("{op} (entity_id={entity_id}): {source}")]
    Infra {
        op: &'static str,
        entity_id: i64,
        #[source]
        source: anyhow::Error,
    },

    /// Nil or malformed request parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Actor ask failed: mailbox closed, no reply, or transport-level trouble.
    #[error("transport: {0}")]
    Transport(String),

    /// A deadline expired before the operation completed.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The durability writer exited before reaching the awaited version.
    #[error("durability writer exited")]
    WriterDone,

    /// The world-side bootstrap ask failed during player init.
    #[error("create city rejected by world")]
    CreateCity,
}

pub type Result<T> = std::result::Result<T, GameError>;

impl GameError {
    /// Business rejection where the reason doubles as the message.
    pub fn biz(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::Biz {
            message: reason.clone(),
            reason,
        }
    }

    pub fn infra(op: &'static str, entity_id: i64, source: anyhow::Error) -> Self {
        Self::Infra {
            op,
            entity_id,
            source,
        }
    }

    pub fn is_biz(&self) -> bool {
        matches!(self, Self::Biz { .. })
    }

    /// Stable reason code for business rejections, empty otherwise.
    pub fn reason(&self) -> &str {
        match self {
            Self::Biz { reason, .. } => reason,
            _ => "",
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for GameError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Transport(format!("lock poisoned: {err}"))
    }
}
