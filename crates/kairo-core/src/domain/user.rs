use crate::domain::ids::UserId;
use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(CoreError::InvalidGender(s.to_string())),
        }
    }
}

/// A registered user as seen by the matcher. Read-only from the engine's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: UserId,
    pub name: Option<String>,
    /// Canonical phone form, compared verbatim against variation tokens.
    pub phone_number: String,
    pub profile_picture: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub created_at: i64,
}

impl DirectoryUser {
    pub fn is_profile_complete(&self) -> bool {
        let has_name = self
            .name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty());
        has_name
            && !self.phone_number.trim().is_empty()
            && self.date_of_birth.is_some()
            && self.gender.is_some()
    }
}

pub fn parse_date_of_birth(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidDateOfBirth(raw.to_string()))
}
