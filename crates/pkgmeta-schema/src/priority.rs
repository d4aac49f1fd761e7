use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Channel priority rank of a record. Lower ranks are preferred.
///
/// Compares against other ranks and against bare integers alike, so
/// `Priority::new(3) == 3` and `Priority::new(3) < 4` both hold.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Priority(i64);

impl Priority {
    pub const fn new(rank: i64) -> Self {
        Self(rank)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for Priority {
    fn from(rank: i64) -> Self {
        Self(rank)
    }
}

impl From<Priority> for i64 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl PartialEq<i64> for Priority {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<i64> for Priority {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        Some(self.0.cmp(other))
    }
}

impl PartialEq<Priority> for i64 {
    fn eq(&self, other: &Priority) -> bool {
        *self == other.0
    }
}

impl PartialOrd<Priority> for i64 {
    fn partial_cmp(&self, other: &Priority) -> Option<Ordering> {
        Some(self.cmp(&other.0))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
