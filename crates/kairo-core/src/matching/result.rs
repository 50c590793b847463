use crate::domain::{DirectoryUser, RawContact};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// A variation token equals a key derived from the user's phone.
    Exact,
    /// Only a trailing-digit suffix lined up.
    Fuzzy,
    None,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Fuzzy => "fuzzy",
            MatchType::None => "none",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub contact: RawContact,
    pub match_type: MatchType,
    pub user: Option<DirectoryUser>,
}

impl MatchResult {
    pub fn matched(contact: RawContact, user: DirectoryUser, match_type: MatchType) -> Self {
        debug_assert!(match_type != MatchType::None);
        Self {
            contact,
            match_type,
            user: Some(user),
        }
    }

    pub fn unmatched(contact: RawContact) -> Self {
        Self {
            contact,
            match_type: MatchType::None,
            user: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.user.is_some()
    }
}
