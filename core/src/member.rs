//! The `member` record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique key of a member row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Creates a member id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A member and its account balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique key
    pub member_id: MemberId,
    /// Current balance
    pub money: i64,
}

impl Member {
    /// Creates a member record.
    #[must_use]
    pub fn new(member_id: impl Into<MemberId>, money: i64) -> Self {
        Self {
            member_id: member_id.into(),
            money,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_id_display_matches_inner() {
        let id = MemberId::new("memberA");
        assert_eq!(id.to_string(), "memberA");
        assert_eq!(id.as_str(), "memberA");
    }

    #[test]
    fn test_member_new_accepts_str() {
        let member = Member::new("memberB", 10_000);
        assert_eq!(member.member_id, MemberId::from("memberB"));
        assert_eq!(member.money, 10_000);
    }
}
