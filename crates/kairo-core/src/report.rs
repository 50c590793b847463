use crate::dto::{
    ContactPhoneDto, ContactStatusDto, KairoUserDto, NonKairoUserDto, ReconciliationSummaryDto,
    UserProfileDto,
};
use crate::matching::{MatchResult, MatchType};
use serde::Serialize;

/// Aggregate view over a finished run, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub total_contacts: usize,
    pub kairo_users_count: usize,
    pub non_kairo_users_count: usize,
    pub contacts: Vec<ContactStatusDto>,
    pub summary: ReconciliationSummaryDto,
}

impl ReconciliationReport {
    pub fn from_results(results: &[MatchResult]) -> Self {
        let mut contacts = Vec::with_capacity(results.len());
        let mut kairo_users = Vec::new();
        let mut non_kairo_users = Vec::new();
        let mut exact_matches = 0;
        let mut fuzzy_matches = 0;

        for result in results {
            match (&result.user, result.match_type) {
                (Some(user), match_type) => {
                    match match_type {
                        MatchType::Exact => exact_matches += 1,
                        MatchType::Fuzzy => fuzzy_matches += 1,
                        MatchType::None => {}
                    }
                    kairo_users.push(KairoUserDto {
                        contact_name: result.contact.name.clone(),
                        contact_phone: result.contact.phone.clone(),
                        user_name: user.name.clone(),
                        user_phone: user.phone_number.clone(),
                        user_id: user.id,
                        match_type,
                    });
                    contacts.push(ContactStatusDto {
                        contact_name: result.contact.name.clone(),
                        phone: ContactPhoneDto::Matched(result.contact.phone.clone()),
                        kairo_status: true,
                        match_type,
                        user_profile: Some(UserProfileDto::from(user)),
                    });
                }
                (None, _) => {
                    non_kairo_users.push(NonKairoUserDto {
                        contact_name: result.contact.name.clone(),
                        phone_number: result.contact.phone.clone(),
                    });
                    contacts.push(ContactStatusDto {
                        contact_name: result.contact.name.clone(),
                        phone: ContactPhoneDto::Unmatched(result.contact.phone.clone()),
                        kairo_status: false,
                        match_type: MatchType::None,
                        user_profile: None,
                    });
                }
            }
        }

        let found = kairo_users.len();
        let not_found = non_kairo_users.len();
        Self {
            total_contacts: results.len(),
            kairo_users_count: found,
            non_kairo_users_count: not_found,
            contacts,
            summary: ReconciliationSummaryDto {
                total_uploaded: results.len(),
                found_in_kairo: found,
                not_found_in_kairo: not_found,
                exact_matches,
                fuzzy_matches,
                kairo_users,
                non_kairo_users,
            },
        }
    }
}
