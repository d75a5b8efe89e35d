//! Robot identifiers.
//!
//! Robot ids are assigned by the caller (e.g. `"robot-1"`), so unlike an
//! index-based id they are an owned string.  The wrapper keeps them from being
//! confused with robot names, which are also strings.

use std::borrow::Borrow;
use std::fmt;

/// Caller-assigned unique robot identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RobotId(pub String);

impl RobotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty string, which the command layer rejects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RobotId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RobotId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for RobotId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
