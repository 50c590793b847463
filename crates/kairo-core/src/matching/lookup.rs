use crate::domain::{normalize_phone, DirectoryUser, NormalizedPhone};
use crate::matching::result::MatchType;
use crate::variations::{PhoneVariations, VariationGenerator, MIN_MATCHABLE_DIGITS};
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Trailing-digit windows registered for each directory user.
const USER_SUFFIX_LENGTHS: RangeInclusive<usize> = 8..=10;

/// A contact with its tokens computed once per run.
#[derive(Debug)]
pub(crate) struct PreparedContact {
    pub(crate) tokens: PhoneVariations,
    pub(crate) phone: Option<NormalizedPhone>,
}

impl PreparedContact {
    pub(crate) fn new(generator: &VariationGenerator<'_>, raw_phone: &str) -> Self {
        Self {
            tokens: generator.generate(raw_phone),
            phone: normalize_phone(raw_phone).ok(),
        }
    }
}

/// Keys derived from directory users, pointing back at the user.
///
/// Later users overwrite keys registered by earlier ones, and within one
/// user the canonical phone and suffixes overwrite its variation tokens.
pub(crate) struct LookupMap<'u> {
    entries: HashMap<String, &'u DirectoryUser>,
}

impl<'u> LookupMap<'u> {
    pub(crate) fn build<I>(generator: &VariationGenerator<'_>, users: I) -> Self
    where
        I: IntoIterator<Item = &'u DirectoryUser>,
    {
        let mut entries = HashMap::new();
        for user in users {
            for token in generator.generate(&user.phone_number) {
                entries.insert(token, user);
            }
            entries.insert(user.phone_number.clone(), user);

            let Ok(phone) = normalize_phone(&user.phone_number) else {
                continue;
            };
            if phone.len() < MIN_MATCHABLE_DIGITS {
                continue;
            }
            for len in USER_SUFFIX_LENGTHS {
                if let Some(suffix) = phone.suffix(len) {
                    entries.insert(suffix.to_string(), user);
                }
            }
        }
        Self { entries }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First token hit is exact; failing that, the longest suffix hit is fuzzy.
    pub(crate) fn classify(
        &self,
        contact: &PreparedContact,
    ) -> Option<(&'u DirectoryUser, MatchType)> {
        if self.is_empty() {
            return None;
        }

        for token in contact.tokens.iter() {
            if let Some(user) = self.entries.get(token) {
                return Some((*user, MatchType::Exact));
            }
        }

        let phone = contact.phone.as_ref()?;
        for len in USER_SUFFIX_LENGTHS.rev() {
            let Some(suffix) = phone.suffix(len) else {
                continue;
            };
            if let Some(user) = self.entries.get(suffix) {
                return Some((*user, MatchType::Fuzzy));
            }
        }
        None
    }
}
