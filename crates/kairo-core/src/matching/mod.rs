//! Resolving uploaded contacts against the user directory.
//!
//! Contacts are processed in fixed-size batches. Each batch makes at most two
//! directory round-trips: one exact lookup over every token in the batch and,
//! for whatever that did not resolve, one pattern lookup. Batches are
//! independent and may run on a bounded worker pool; results always come back
//! in input order.

pub mod directory;
mod lookup;
pub mod observer;
pub mod result;

pub use directory::{phone_matches_pattern, Directory, MemoryDirectory};
pub use observer::{MatchObserver, NoopObserver, TracingObserver};
pub use result::{MatchResult, MatchType};

use crate::dialing::DialingRuleTable;
use crate::domain::{digits_only, DirectoryUser, RawContact, UserId};
use crate::error::{DirectoryError, ReconcileError, ValidationError};
use crate::variations::{PhoneVariations, VariationGenerator};
use lookup::{LookupMap, PreparedContact};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_MAX_WORKERS: usize = 4;
pub const DEFAULT_FUZZY_TOKEN_LIMIT: usize = 5;
pub const DEFAULT_PATTERN_LIMIT: usize = 50;

static NOOP_OBSERVER: NoopObserver = NoopObserver;

/// Which directory users a contact may be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClaimPolicy {
    /// Every user found for the batch is visible to every contact in it, and
    /// the pattern lookup only runs when the whole batch found nobody. A
    /// contact may then match a user discovered through a neighbour's tokens,
    /// so results depend on batch composition and contact order.
    Shared,
    /// A contact only sees users discovered through its own tokens, and gets
    /// a pattern lookup whenever its own exact lookup came back empty.
    /// Results do not depend on batch size or on the other contacts.
    #[default]
    PerContact,
}

impl ClaimPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimPolicy::Shared => "shared",
            ClaimPolicy::PerContact => "per-contact",
        }
    }
}

impl fmt::Display for ClaimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(ClaimPolicy::Shared),
            "per-contact" | "per_contact" => Ok(ClaimPolicy::PerContact),
            other => Err(format!(
                "invalid claim policy: {other} (expected shared|per-contact)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub batch_size: usize,
    pub max_workers: usize,
    /// Tokens turned into pattern lookups when exact lookup finds nothing.
    pub fuzzy_token_limit: usize,
    /// Users returned per pattern.
    pub pattern_limit: usize,
    pub claim_policy: ClaimPolicy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            fuzzy_token_limit: DEFAULT_FUZZY_TOKEN_LIMIT,
            pattern_limit: DEFAULT_PATTERN_LIMIT,
            claim_policy: ClaimPolicy::default(),
        }
    }
}

type Classification = Option<(DirectoryUser, MatchType)>;

pub struct BatchMatcher<'a, D: ?Sized> {
    directory: &'a D,
    generator: VariationGenerator<'a>,
    options: MatchOptions,
    observer: &'a dyn MatchObserver,
}

impl<'a, D> BatchMatcher<'a, D>
where
    D: Directory + ?Sized,
{
    pub fn new(directory: &'a D, table: &'a DialingRuleTable) -> Self {
        Self {
            directory,
            generator: VariationGenerator::new(table),
            options: MatchOptions::default(),
            observer: &NOOP_OBSERVER,
        }
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn MatchObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Classifies every contact, in input order.
    ///
    /// A failed directory lookup aborts the whole run; no partial results are
    /// returned. When several batches fail, the earliest batch is reported.
    pub fn reconcile(&self, contacts: &[RawContact]) -> Result<Vec<MatchResult>, ReconcileError> {
        if contacts.is_empty() {
            return Err(ValidationError::EmptyContacts.into());
        }

        let batches: Vec<&[RawContact]> = contacts.chunks(self.options.batch_size.max(1)).collect();
        let workers = self.options.max_workers.clamp(1, batches.len());

        let outcomes: Vec<Result<Vec<MatchResult>, ReconcileError>> = if workers == 1 {
            batches
                .iter()
                .enumerate()
                .map(|(index, batch)| self.resolve_batch(index, batch))
                .collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|index| format!("kairo-match-{index}"))
                .build()?;
            pool.install(|| {
                batches
                    .par_iter()
                    .enumerate()
                    .map(|(index, batch)| self.resolve_batch(index, batch))
                    .collect()
            })
        };

        let mut results = Vec::with_capacity(contacts.len());
        for outcome in outcomes {
            results.extend(outcome?);
        }

        let matched = results.iter().filter(|result| result.is_matched()).count();
        self.observer.run_finished(results.len(), matched);
        Ok(results)
    }

    fn resolve_batch(
        &self,
        index: usize,
        batch: &[RawContact],
    ) -> Result<Vec<MatchResult>, ReconcileError> {
        let prepared: Vec<PreparedContact> = batch
            .iter()
            .map(|contact| PreparedContact::new(&self.generator, &contact.phone))
            .collect();

        let mut batch_tokens = PhoneVariations::default();
        let mut owners: HashMap<&str, Vec<usize>> = HashMap::new();
        for (position, contact) in prepared.iter().enumerate() {
            for token in contact.tokens.iter() {
                batch_tokens.insert(token);
                owners.entry(token).or_default().push(position);
            }
        }
        self.observer
            .batch_started(index, batch.len(), batch_tokens.len());

        let exact = if batch_tokens.is_empty() {
            Vec::new()
        } else {
            self.directory
                .find_by_exact_phone_set(batch_tokens.as_slice())
                .map_err(|source| ReconcileError::DirectoryUnavailable {
                    batch: index,
                    source,
                })?
        };

        let classified = match self.options.claim_policy {
            ClaimPolicy::Shared => self.classify_shared(index, &prepared, &batch_tokens, exact)?,
            ClaimPolicy::PerContact => self.classify_per_contact(index, &prepared, &owners, exact)?,
        };

        Ok(batch
            .iter()
            .zip(classified)
            .map(|(contact, hit)| match hit {
                Some((user, match_type)) => {
                    self.observer
                        .contact_matched(index, contact, &user, match_type);
                    MatchResult::matched(contact.clone(), user, match_type)
                }
                None => {
                    self.observer.contact_unmatched(index, contact);
                    MatchResult::unmatched(contact.clone())
                }
            })
            .collect())
    }

    fn classify_shared(
        &self,
        index: usize,
        prepared: &[PreparedContact],
        batch_tokens: &PhoneVariations,
        exact: Vec<DirectoryUser>,
    ) -> Result<Vec<Classification>, ReconcileError> {
        let exact_users = exact.len();
        let users: Vec<DirectoryUser> = if exact.is_empty() {
            let patterns = pattern_digits(batch_tokens.iter(), self.options.fuzzy_token_limit);
            let found = self.lookup_patterns(index, &patterns)?;
            dedup_users(found.iter().flatten())
                .into_iter()
                .cloned()
                .collect()
        } else {
            exact
        };
        self.observer
            .batch_resolved(index, exact_users, users.len() - exact_users);

        let lookup = LookupMap::build(&self.generator, &users);
        Ok(prepared
            .iter()
            .map(|contact| {
                lookup
                    .classify(contact)
                    .map(|(user, match_type)| (user.clone(), match_type))
            })
            .collect())
    }

    fn classify_per_contact(
        &self,
        index: usize,
        prepared: &[PreparedContact],
        owners: &HashMap<&str, Vec<usize>>,
        exact: Vec<DirectoryUser>,
    ) -> Result<Vec<Classification>, ReconcileError> {
        let mut candidates: Vec<Vec<&DirectoryUser>> = vec![Vec::new(); prepared.len()];
        for user in &exact {
            if let Some(positions) = owners.get(user.phone_number.as_str()) {
                for &position in positions {
                    candidates[position].push(user);
                }
            }
        }

        let mut contact_patterns: Vec<Vec<String>> = vec![Vec::new(); prepared.len()];
        let mut batch_patterns = PhoneVariations::default();
        for (position, contact) in prepared.iter().enumerate() {
            if !candidates[position].is_empty() || contact.tokens.is_empty() {
                continue;
            }
            let patterns = pattern_digits(contact.tokens.iter(), self.options.fuzzy_token_limit);
            for pattern in &patterns {
                batch_patterns.insert(pattern.as_str());
            }
            contact_patterns[position] = patterns;
        }

        let found = self.lookup_patterns(index, batch_patterns.as_slice())?;
        let by_pattern: HashMap<&str, &[DirectoryUser]> = batch_patterns
            .iter()
            .zip(found.iter().map(Vec::as_slice))
            .collect();
        let pattern_users = dedup_users(found.iter().flatten()).len();
        self.observer
            .batch_resolved(index, exact.len(), pattern_users);

        let mut classified = Vec::with_capacity(prepared.len());
        for (position, contact) in prepared.iter().enumerate() {
            let visible: Vec<&DirectoryUser> = if candidates[position].is_empty() {
                dedup_users(
                    contact_patterns[position]
                        .iter()
                        .filter_map(|pattern| by_pattern.get(pattern.as_str()))
                        .flat_map(|users| users.iter()),
                )
            } else {
                candidates[position].clone()
            };
            let lookup = LookupMap::build(&self.generator, visible);
            classified.push(
                lookup
                    .classify(contact)
                    .map(|(user, match_type)| (user.clone(), match_type)),
            );
        }
        Ok(classified)
    }

    fn lookup_patterns(
        &self,
        index: usize,
        patterns: &[String],
    ) -> Result<Vec<Vec<DirectoryUser>>, ReconcileError> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }
        self.directory
            .find_by_phone_patterns(patterns, self.options.pattern_limit)
            .map_err(|source: DirectoryError| ReconcileError::DirectoryUnavailable {
                batch: index,
                source,
            })
    }
}

/// Digit-only forms of the first `limit` tokens, without repeats.
fn pattern_digits<'t>(tokens: impl Iterator<Item = &'t str>, limit: usize) -> Vec<String> {
    let mut patterns = PhoneVariations::default();
    for token in tokens.take(limit) {
        let digits = digits_only(token);
        if !digits.is_empty() {
            patterns.insert(digits);
        }
    }
    patterns.into_iter().collect()
}

fn dedup_users<'u>(users: impl Iterator<Item = &'u DirectoryUser>) -> Vec<&'u DirectoryUser> {
    let mut seen: HashSet<UserId> = HashSet::new();
    users.filter(|user| seen.insert(user.id)).collect()
}
