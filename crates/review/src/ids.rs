use derive_more::{Display, From};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies one diff session, e.g. a notebook cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionId(String);

/// Identifies a group of sessions, e.g. a notebook
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl GroupId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
