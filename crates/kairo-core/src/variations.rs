//! Candidate representations of a phone number.
//!
//! Without knowing the contact's home country there is no single correct
//! form, so a number is expanded into every plausible way a directory might
//! have stored it. Order of generation is stable and meaningful: matchers
//! walk tokens front to back and take the first hit.

use crate::dialing::DialingRuleTable;
use crate::domain::phone::{digit_count, digits_only, normalize_phone, strip_extension};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Digit-length bounds for any retained token.
pub const TOKEN_DIGITS: RangeInclusive<usize> = 7..=15;

/// Numbers with fewer digits than this are treated as unmatchable.
pub const MIN_MATCHABLE_DIGITS: usize = 7;

const SHORT_NUMBER_DIGITS: RangeInclusive<usize> = 7..=9;
const TRAILING_WINDOW_LENGTHS: RangeInclusive<usize> = 10..=11;
const INTERNATIONAL_ACCESS_PREFIX: &str = "00";

/// Insertion-ordered set of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneVariations {
    tokens: Vec<String>,
    seen: HashSet<String>,
}

impl PhoneVariations {
    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        let token = token.into();
        if self.seen.contains(&token) {
            return false;
        }
        self.seen.insert(token.clone());
        self.tokens.push(token);
        true
    }

    pub fn contains(&self, token: &str) -> bool {
        self.seen.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn retain_digit_lengths(self, bounds: RangeInclusive<usize>) -> Self {
        let mut kept = PhoneVariations::default();
        for token in self.tokens {
            if bounds.contains(&digit_count(&token)) {
                kept.insert(token);
            }
        }
        kept
    }
}

impl IntoIterator for PhoneVariations {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VariationGenerator<'a> {
    table: &'a DialingRuleTable,
}

impl<'a> VariationGenerator<'a> {
    pub fn new(table: &'a DialingRuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a DialingRuleTable {
        self.table
    }

    pub fn generate(&self, raw: &str) -> PhoneVariations {
        let raw = strip_extension(raw);
        let mut out = PhoneVariations::default();
        let normalized = match normalize_phone(raw) {
            Ok(normalized) => normalized,
            Err(_) => return out,
        };
        if normalized.len() < MIN_MATCHABLE_DIGITS {
            return out;
        }
        let digits = normalized.digits.as_str();

        out.insert(digits);
        out.insert(format!("+{digits}"));

        for rule in self.table.rules() {
            if digits.starts_with(&rule.code) {
                out.insert(digits);
                out.insert(format!("+{digits}"));
                let local = digits.get(rule.strip_length..).unwrap_or_default();
                if rule.accepts(local.len()) {
                    out.insert(local);
                    out.insert(format!("0{local}"));
                }
            } else if rule.accepts(digits.len()) {
                out.insert(format!("{}{digits}", rule.code));
                out.insert(format!("+{}{digits}", rule.code));
            }
        }

        out.insert(format!("0{digits}"));
        let raw_digits = digits_only(raw);
        if raw_digits.starts_with('0') {
            let unpadded = digits.trim_start_matches('0');
            if unpadded.len() >= MIN_MATCHABLE_DIGITS {
                out.insert(unpadded);
            }
        }

        if raw.contains(INTERNATIONAL_ACCESS_PREFIX)
            && raw_digits.starts_with(INTERNATIONAL_ACCESS_PREFIX)
            && raw_digits.len() > 9
        {
            let international = &raw_digits[INTERNATIONAL_ACCESS_PREFIX.len()..];
            out.insert(international);
            out.insert(format!("+{international}"));
        }

        if digits.len() > 11 {
            for len in TRAILING_WINDOW_LENGTHS {
                let tail = &digits[digits.len() - len..];
                out.insert(tail);
                out.insert(format!("0{tail}"));
            }
        }

        if SHORT_NUMBER_DIGITS.contains(&digits.len()) {
            out.insert(format!("0{digits}"));
            for code in self.table.fallback_codes() {
                out.insert(format!("{code}{digits}"));
                out.insert(format!("+{code}{digits}"));
            }
        }

        out.retain_digit_lengths(TOKEN_DIGITS)
    }
}
