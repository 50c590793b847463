use crate::domain::{DirectoryUser, Gender, UserId};
use crate::matching::MatchType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDto {
    pub user_id: UserId,
    pub name: Option<String>,
    pub phone_number: String,
    pub profile_picture: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub profile_complete: bool,
    pub joined_at: i64,
}

impl From<&DirectoryUser> for UserProfileDto {
    fn from(user: &DirectoryUser) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            phone_number: user.phone_number.clone(),
            profile_picture: user.profile_picture.clone(),
            date_of_birth: user
                .date_of_birth
                .map(|date| date.format("%Y-%m-%d").to_string()),
            gender: user.gender,
            profile_complete: user.is_profile_complete(),
            joined_at: user.created_at,
        }
    }
}

/// The uploaded phone, keyed `contactPhone` for matches and `phoneNumber` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContactPhoneDto {
    #[serde(rename = "contactPhone")]
    Matched(String),
    #[serde(rename = "phoneNumber")]
    Unmatched(String),
}

impl ContactPhoneDto {
    pub fn as_str(&self) -> &str {
        match self {
            ContactPhoneDto::Matched(phone) | ContactPhoneDto::Unmatched(phone) => phone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactStatusDto {
    pub contact_name: String,
    #[serde(flatten)]
    pub phone: ContactPhoneDto,
    pub kairo_status: bool,
    pub match_type: MatchType,
    pub user_profile: Option<UserProfileDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KairoUserDto {
    pub contact_name: String,
    pub contact_phone: String,
    pub user_name: Option<String>,
    pub user_phone: String,
    pub user_id: UserId,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonKairoUserDto {
    pub contact_name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummaryDto {
    pub total_uploaded: usize,
    pub found_in_kairo: usize,
    pub not_found_in_kairo: usize,
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub kairo_users: Vec<KairoUserDto>,
    pub non_kairo_users: Vec<NonKairoUserDto>,
}
