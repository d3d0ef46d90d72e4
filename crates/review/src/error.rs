use derive_more::Display;

use buffer_diff::ChunkIdentity;

use crate::ids::{GroupId, SessionId};

/// Failures reported by an editing surface adapter
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SurfaceError {
    /// A position no longer exists in the surface text
    #[display(fmt = "position {} is outside the surface text ({} chars)", position, len)]
    OutOfRange { position: usize, len: usize },

    /// The host tore the surface down
    #[display(fmt = "surface is detached")]
    Detached,

    #[display(fmt = "{}", _0)]
    Other(String),
}

impl std::error::Error for SurfaceError {}

/// What a stale reference pointed at
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum StaleTarget {
    #[display(fmt = "chunk {}", _0)]
    Chunk(ChunkIdentity),
    #[display(fmt = "session {}", _0)]
    Session(SessionId),
    #[display(fmt = "group {}", _0)]
    Group(GroupId),
}

/// Errors of the review engine.
///
/// Only `PrimitiveFailure` and `DocumentWrite` ever reach a host; stale
/// references and surface failures are logged and dropped at the session.
#[derive(Debug, Display)]
pub enum ReviewError {
    #[display(fmt = "stale reference to {}", _0)]
    StaleReference(StaleTarget),

    #[display(fmt = "diff primitive failed: {:#}", _0)]
    PrimitiveFailure(anyhow::Error),

    #[display(fmt = "document write failed: {:#}", _0)]
    DocumentWrite(anyhow::Error),

    #[display(fmt = "surface error: {}", _0)]
    Surface(SurfaceError),
}

impl std::error::Error for ReviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReviewError::PrimitiveFailure(err) | ReviewError::DocumentWrite(err) => Some(&**err),
            ReviewError::Surface(err) => Some(err),
            ReviewError::StaleReference(_) => None,
        }
    }
}

impl From<SurfaceError> for ReviewError {
    fn from(err: SurfaceError) -> Self {
        ReviewError::Surface(err)
    }
}

impl ReviewError {
    pub fn is_stale(&self) -> bool {
        matches!(self, ReviewError::StaleReference(_))
    }
}
