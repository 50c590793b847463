//! International calling-code rules.
//!
//! The table is plain data: each rule says which local-number lengths follow a
//! calling code and how many digits to strip to reach the local number. It is
//! loaded once and shared by reference between the variation generator and
//! every matcher worker.

use crate::error::DialingTableError;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

const BUILTIN_TABLE: &str = include_str!("../data/dialing_codes.toml");

/// No E.164 number carries more than 15 digits.
const MAX_LOCAL_LENGTH: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialingCodeRule {
    pub code: String,
    pub accepted_local_lengths: BTreeSet<usize>,
    pub strip_length: usize,
}

impl DialingCodeRule {
    pub fn accepts(&self, local_length: usize) -> bool {
        self.accepted_local_lengths.contains(&local_length)
    }
}

#[derive(Debug, Clone)]
pub struct DialingRuleTable {
    rules: Vec<DialingCodeRule>,
    fallback_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    #[serde(default)]
    fallback_codes: Vec<String>,
    rules: Vec<RuleFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    code: String,
    local_lengths: Vec<usize>,
    strip_length: usize,
}

impl DialingRuleTable {
    /// The table compiled into the crate.
    pub fn builtin() -> Result<Self, DialingTableError> {
        Self::from_toml_str(BUILTIN_TABLE)
    }

    pub fn load(path: &Path) -> Result<Self, DialingTableError> {
        let contents = fs::read_to_string(path).map_err(|source| DialingTableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, DialingTableError> {
        let parsed: TableFile = toml::from_str(contents)?;
        let rules = parsed
            .rules
            .into_iter()
            .map(|rule| DialingCodeRule {
                code: rule.code,
                accepted_local_lengths: rule.local_lengths.into_iter().collect(),
                strip_length: rule.strip_length,
            })
            .collect();
        Self::new(rules, parsed.fallback_codes)
    }

    pub fn new(
        mut rules: Vec<DialingCodeRule>,
        fallback_codes: Vec<String>,
    ) -> Result<Self, DialingTableError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            validate_rule(rule)?;
            if !seen.insert(rule.code.as_str()) {
                return Err(DialingTableError::DuplicateCode(rule.code.clone()));
            }
        }
        for code in &fallback_codes {
            if !is_calling_code(code) {
                return Err(DialingTableError::InvalidFallbackCode(code.clone()));
            }
        }

        rules.sort_by(|a, b| numeric_order(&a.code, &b.code));
        Ok(Self {
            rules,
            fallback_codes,
        })
    }

    /// Rules in ascending numeric order of their calling code.
    pub fn rules(&self) -> &[DialingCodeRule] {
        &self.rules
    }

    pub fn fallback_codes(&self) -> &[String] {
        &self.fallback_codes
    }

    pub fn get(&self, code: &str) -> Option<&DialingCodeRule> {
        self.rules.iter().find(|rule| rule.code == code)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn validate_rule(rule: &DialingCodeRule) -> Result<(), DialingTableError> {
    if !is_calling_code(&rule.code) {
        return Err(DialingTableError::InvalidCode(rule.code.clone()));
    }
    if rule.strip_length == 0 || rule.strip_length > rule.code.len() {
        return Err(DialingTableError::InvalidStripLength {
            code: rule.code.clone(),
            strip_length: rule.strip_length,
        });
    }
    if rule.accepted_local_lengths.is_empty() {
        return Err(DialingTableError::MissingLocalLengths(rule.code.clone()));
    }
    if let Some(&length) = rule
        .accepted_local_lengths
        .iter()
        .find(|&&length| length == 0 || length > MAX_LOCAL_LENGTH)
    {
        return Err(DialingTableError::InvalidLocalLength {
            code: rule.code.clone(),
            length,
        });
    }
    Ok(())
}

fn is_calling_code(code: &str) -> bool {
    !code.is_empty() && code.len() <= 4 && code.chars().all(|ch| ch.is_ascii_digit())
}

// Codes never start with 0, so shorter means numerically smaller.
fn numeric_order(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
