use kairo_core::{
    canonical_phone, BatchMatcher, ClaimPolicy, DialingCodeRule, DialingRuleTable, Directory,
    DirectoryError, DirectoryUser, MatchObserver, MatchOptions, MatchType, MemoryDirectory,
    RawContact, ReconcileError, ReconciliationReport, UserId, ValidationError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

struct CountingDirectory {
    inner: MemoryDirectory,
    exact_calls: AtomicUsize,
    pattern_calls: AtomicUsize,
    fail_from_call: Option<usize>,
}

impl CountingDirectory {
    fn new(users: Vec<DirectoryUser>) -> Self {
        Self {
            inner: MemoryDirectory::new(users),
            exact_calls: AtomicUsize::new(0),
            pattern_calls: AtomicUsize::new(0),
            fail_from_call: None,
        }
    }

    fn failing_from(users: Vec<DirectoryUser>, call: usize) -> Self {
        Self {
            fail_from_call: Some(call),
            ..Self::new(users)
        }
    }

    fn calls(&self) -> (usize, usize) {
        (
            self.exact_calls.load(Ordering::SeqCst),
            self.pattern_calls.load(Ordering::SeqCst),
        )
    }
}

impl Directory for CountingDirectory {
    fn find_by_exact_phone_set(
        &self,
        tokens: &[String],
    ) -> Result<Vec<DirectoryUser>, DirectoryError> {
        let call = self.exact_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_from_call.is_some_and(|from| call >= from) {
            return Err(DirectoryError::Unavailable("connection reset".to_string()));
        }
        self.inner.find_by_exact_phone_set(tokens)
    }

    fn find_by_phone_pattern(
        &self,
        digits: &str,
        limit: usize,
    ) -> Result<Vec<DirectoryUser>, DirectoryError> {
        self.inner.find_by_phone_pattern(digits, limit)
    }

    fn find_by_phone_patterns(
        &self,
        patterns: &[String],
        limit: usize,
    ) -> Result<Vec<Vec<DirectoryUser>>, DirectoryError> {
        self.pattern_calls.fetch_add(1, Ordering::SeqCst);
        patterns
            .iter()
            .map(|digits| self.inner.find_by_phone_pattern(digits, limit))
            .collect()
    }
}

#[derive(Default)]
struct RecordingObserver {
    batches: Mutex<Vec<usize>>,
    finished: Mutex<Option<(usize, usize)>>,
}

impl MatchObserver for RecordingObserver {
    fn batch_started(&self, batch: usize, _contacts: usize, _tokens: usize) {
        self.batches.lock().expect("lock").push(batch);
    }

    fn run_finished(&self, contacts: usize, matched: usize) {
        *self.finished.lock().expect("lock") = Some((contacts, matched));
    }
}

fn user(name: &str, phone: &str, created_at: i64) -> DirectoryUser {
    DirectoryUser {
        id: UserId::new(),
        name: Some(name.to_string()),
        phone_number: phone.to_string(),
        profile_picture: None,
        date_of_birth: None,
        gender: None,
        created_at,
    }
}

fn nanp_only_table() -> DialingRuleTable {
    DialingRuleTable::new(
        vec![DialingCodeRule {
            code: "1".to_string(),
            accepted_local_lengths: [10].into_iter().collect(),
            strip_length: 1,
        }],
        Vec::new(),
    )
    .expect("table")
}

fn options(batch_size: usize, max_workers: usize, claim_policy: ClaimPolicy) -> MatchOptions {
    MatchOptions {
        batch_size,
        max_workers,
        claim_policy,
        ..MatchOptions::default()
    }
}

#[test]
fn empty_directory_leaves_contact_unmatched() {
    let table = DialingRuleTable::builtin().expect("table");
    let directory = CountingDirectory::new(Vec::new());
    let contacts = vec![RawContact::new("A", "5551234567")];

    let results = BatchMatcher::new(&directory, &table)
        .reconcile(&contacts)
        .expect("reconcile");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].match_type, MatchType::None);
    assert!(results[0].user.is_none());

    let report = ReconciliationReport::from_results(&results);
    assert_eq!(report.summary.found_in_kairo, 0);
    assert_eq!(report.summary.not_found_in_kairo, 1);
    assert!(report.contacts[0].user_profile.is_none());
}

#[test]
fn international_form_matches_local_directory_entry() {
    let table = DialingRuleTable::builtin().expect("table");
    let stored = user("Ada", "4155551234", 1);
    let directory = CountingDirectory::new(vec![stored.clone()]);
    let contacts = vec![RawContact::new("Ada L", "+14155551234")];

    let results = BatchMatcher::new(&directory, &table)
        .reconcile(&contacts)
        .expect("reconcile");
    assert_eq!(results[0].match_type, MatchType::Exact);
    assert_eq!(results[0].user.as_ref().map(|u| u.id), Some(stored.id));
    assert_eq!(directory.calls(), (1, 0));
}

#[test]
fn canonical_equality_is_always_exact() {
    let table = DialingRuleTable::builtin().expect("table");
    let phones = ["+923001234567", "4155551234", "05551234", "+442079460018"];
    let users: Vec<DirectoryUser> = phones
        .iter()
        .enumerate()
        .map(|(index, phone)| user("U", phone, index as i64))
        .collect();
    let directory = CountingDirectory::new(users.clone());
    let contacts: Vec<RawContact> = phones.iter().map(|phone| RawContact::new("C", *phone)).collect();

    for policy in [ClaimPolicy::PerContact, ClaimPolicy::Shared] {
        let results = BatchMatcher::new(&directory, &table)
            .with_options(options(50, 1, policy))
            .reconcile(&contacts)
            .expect("reconcile");
        for result in &results {
            assert_eq!(result.match_type, MatchType::Exact, "{policy}: {result:?}");
        }
    }
}

#[test]
fn registered_raw_phone_matches_the_same_raw_contact() {
    let table = DialingRuleTable::builtin().expect("table");
    let raws = [
        "415-555-1212 x89",
        "0044 20 7946 0018",
        "0300 7654321",
        "+92 300 1234567#2",
    ];
    let users: Vec<DirectoryUser> = raws
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let stored = canonical_phone(raw).expect("canonical");
            user("U", &stored, index as i64)
        })
        .collect();
    assert_eq!(users[0].phone_number, "4155551212");
    assert_eq!(users[2].phone_number, "03007654321");
    let directory = CountingDirectory::new(users.clone());
    let contacts: Vec<RawContact> = raws.iter().map(|raw| RawContact::new("C", *raw)).collect();

    for policy in [ClaimPolicy::PerContact, ClaimPolicy::Shared] {
        let results = BatchMatcher::new(&directory, &table)
            .with_options(options(50, 1, policy))
            .reconcile(&contacts)
            .expect("reconcile");
        for (result, stored) in results.iter().zip(&users) {
            assert_eq!(result.match_type, MatchType::Exact, "{policy}: {result:?}");
            assert_eq!(result.user.as_ref().map(|u| u.id), Some(stored.id));
        }
    }
}

#[test]
fn empty_upload_is_rejected_before_lookup() {
    let table = DialingRuleTable::builtin().expect("table");
    let directory = CountingDirectory::new(Vec::new());

    let err = BatchMatcher::new(&directory, &table)
        .reconcile(&[])
        .unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Validation(ValidationError::EmptyContacts)
    ));
    assert_eq!(directory.calls(), (0, 0));
}

#[test]
fn pattern_lookup_runs_only_when_exact_lookup_is_empty() {
    let table = nanp_only_table();
    let stored = user("Lena", "+4915112345678", 1);
    let directory = CountingDirectory::new(vec![stored.clone()]);

    // no token equals the stored number, but the stored number contains one
    let contacts = vec![RawContact::new("Lena", "15112345678")];
    let results = BatchMatcher::new(&directory, &table)
        .reconcile(&contacts)
        .expect("reconcile");
    assert_eq!(directory.calls(), (1, 1));
    assert_eq!(results[0].user.as_ref().map(|u| u.id), Some(stored.id));
    assert_eq!(results[0].match_type, MatchType::Exact);
}

#[test]
fn suffix_only_overlap_is_fuzzy() {
    let table = nanp_only_table();
    let stored = user("Lena", "+4915112345678", 1);
    let directory = CountingDirectory::new(vec![stored.clone()]);

    let contacts = vec![RawContact::new("Lena (work)", "95112345678")];
    let results = BatchMatcher::new(&directory, &table)
        .reconcile(&contacts)
        .expect("reconcile");
    assert_eq!(results[0].match_type, MatchType::Fuzzy);
    assert_eq!(results[0].user.as_ref().map(|u| u.id), Some(stored.id));
}

#[test]
fn fuzzy_never_overrides_an_exact_candidate() {
    let table = nanp_only_table();
    let exact = user("Exact", "95112345678", 1);
    let suffix = user("Suffix", "+4915112345678", 2);
    let directory = CountingDirectory::new(vec![exact.clone(), suffix]);

    let contacts = vec![RawContact::new("C", "95112345678")];
    let results = BatchMatcher::new(&directory, &table)
        .reconcile(&contacts)
        .expect("reconcile");
    assert_eq!(results[0].match_type, MatchType::Exact);
    assert_eq!(results[0].user.as_ref().map(|u| u.id), Some(exact.id));
    assert_eq!(directory.calls(), (1, 0));
}

fn mixed_fixture() -> (Vec<DirectoryUser>, Vec<RawContact>) {
    let users = vec![
        user("Ada", "4155551234", 1),
        user("Bilal", "+923001234567", 2),
        user("Chidi", "+2348031234567", 3),
        user("Dana", "+442079460018", 4),
        user("Lena", "+4915112345678", 5),
        user("Mei", "+8613812345678", 6),
    ];
    let contacts = vec![
        RawContact::new("ada", "+1 (415) 555-1234"),
        RawContact::new("stranger", "+1 202 555 0199"),
        RawContact::new("bilal", "0300 1234567"),
        RawContact::new("chidi", "08031234567"),
        RawContact::new("dana", "0044 20 7946 0018"),
        RawContact::new("lena", "95112345678"),
        RawContact::new("short", "12345"),
        RawContact::new("mei", "138 1234 5678"),
        RawContact::new("lena again", "+49 151 12345678"),
        RawContact::new("nobody", "+61 491 570 006"),
    ];
    (users, contacts)
}

#[test]
fn per_contact_results_do_not_depend_on_batching() {
    let table = DialingRuleTable::builtin().expect("table");
    let (users, contacts) = mixed_fixture();
    let directory = CountingDirectory::new(users);

    let summarize = |batch_size: usize, workers: usize| {
        BatchMatcher::new(&directory, &table)
            .with_options(options(batch_size, workers, ClaimPolicy::PerContact))
            .reconcile(&contacts)
            .expect("reconcile")
            .into_iter()
            .map(|result| {
                (
                    result.contact.name,
                    result.match_type,
                    result.user.map(|user| user.id),
                )
            })
            .collect::<Vec<_>>()
    };

    let baseline = summarize(1000, 1);
    assert_eq!(baseline.len(), contacts.len());
    for (batch_size, workers) in [(1, 1), (1, 4), (3, 2), (7, 8), (50, 4)] {
        assert_eq!(summarize(batch_size, workers), baseline, "batch_size={batch_size}");
    }

    let matched: Vec<&str> = baseline
        .iter()
        .filter(|(_, match_type, _)| *match_type != MatchType::None)
        .map(|(name, _, _)| name.as_str())
        .collect();
    assert!(matched.contains(&"ada"));
    assert!(matched.contains(&"bilal"));
    assert!(matched.contains(&"dana"));
    assert!(!matched.contains(&"short"));
}

#[test]
fn results_keep_input_order_across_workers() {
    let table = DialingRuleTable::builtin().expect("table");
    let (users, contacts) = mixed_fixture();
    let directory = CountingDirectory::new(users);

    let results = BatchMatcher::new(&directory, &table)
        .with_options(options(1, 4, ClaimPolicy::PerContact))
        .reconcile(&contacts)
        .expect("reconcile");
    let names: Vec<&str> = results.iter().map(|r| r.contact.name.as_str()).collect();
    let expected: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, expected);
}

#[test]
fn shared_policy_lets_neighbours_claim_users() {
    let table = DialingRuleTable::builtin().expect("table");
    let stored = user("Lena", "+4915112345678", 1);
    let directory = CountingDirectory::new(vec![stored.clone()]);
    let contacts = vec![
        RawContact::new("lena", "+4915112345678"),
        RawContact::new("someone else", "7712345678"),
    ];

    let shared = BatchMatcher::new(&directory, &table)
        .with_options(options(50, 1, ClaimPolicy::Shared))
        .reconcile(&contacts)
        .expect("reconcile");
    assert_eq!(shared[0].match_type, MatchType::Exact);
    assert_eq!(shared[1].match_type, MatchType::Fuzzy);
    assert_eq!(shared[1].user.as_ref().map(|u| u.id), Some(stored.id));

    let isolated = BatchMatcher::new(&directory, &table)
        .with_options(options(1, 1, ClaimPolicy::Shared))
        .reconcile(&contacts)
        .expect("reconcile");
    assert_eq!(isolated[1].match_type, MatchType::None);

    let per_contact = BatchMatcher::new(&directory, &table)
        .with_options(options(50, 1, ClaimPolicy::PerContact))
        .reconcile(&contacts)
        .expect("reconcile");
    assert_eq!(per_contact[0].match_type, MatchType::Exact);
    assert_eq!(per_contact[1].match_type, MatchType::None);
}

#[test]
fn directory_failure_aborts_the_run() {
    let table = DialingRuleTable::builtin().expect("table");
    let (users, contacts) = mixed_fixture();
    let directory = CountingDirectory::failing_from(users, 2);

    let err = BatchMatcher::new(&directory, &table)
        .with_options(options(4, 1, ClaimPolicy::PerContact))
        .reconcile(&contacts)
        .unwrap_err();
    match err {
        ReconcileError::DirectoryUnavailable { batch, .. } => assert_eq!(batch, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn observer_sees_every_batch() {
    let table = DialingRuleTable::builtin().expect("table");
    let (users, contacts) = mixed_fixture();
    let directory = CountingDirectory::new(users);
    let observer = RecordingObserver::default();

    let results = BatchMatcher::new(&directory, &table)
        .with_options(options(3, 2, ClaimPolicy::PerContact))
        .with_observer(&observer)
        .reconcile(&contacts)
        .expect("reconcile");

    let mut batches = observer.batches.lock().expect("lock").clone();
    batches.sort_unstable();
    assert_eq!(batches, [0, 1, 2, 3]);
    let matched = results.iter().filter(|r| r.is_matched()).count();
    assert_eq!(
        *observer.finished.lock().expect("lock"),
        Some((contacts.len(), matched))
    );
}
