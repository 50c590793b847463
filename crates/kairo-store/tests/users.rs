use kairo_core::domain::{parse_date_of_birth, Gender};
use kairo_store::error::{StoreError, StoreErrorKind};
use kairo_store::repo::UserNew;
use kairo_store::Store;

fn store() -> Store {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store
}

fn user(phone: &str) -> UserNew {
    UserNew {
        name: None,
        phone_number: phone.to_string(),
        profile_picture: None,
        date_of_birth: None,
        gender: None,
    }
}

#[test]
fn create_stores_canonical_phone() {
    let store = store();
    let created = store
        .users()
        .create(
            1_700_000_000,
            UserNew {
                name: Some("  Ada ".to_string()),
                date_of_birth: Some(parse_date_of_birth("1990-04-01").expect("date")),
                gender: Some(Gender::Female),
                ..user("+1 (415) 555-1234")
            },
        )
        .expect("create");
    assert_eq!(created.phone_number, "+14155551234");
    assert_eq!(created.name.as_deref(), Some("Ada"));

    let loaded = store
        .users()
        .get(created.id)
        .expect("get")
        .expect("user exists");
    assert_eq!(loaded, created);

    let by_phone = store
        .users()
        .get_by_phone("+1 415 555 1234")
        .expect("get by phone")
        .expect("user exists");
    assert_eq!(by_phone.id, created.id);
}

#[test]
fn duplicate_phone_is_rejected() {
    let store = store();
    store
        .users()
        .create(1, user("+14155551234"))
        .expect("create");
    let err = store
        .users()
        .create(2, user("+1 415-555-1234"))
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicatePhone(ref phone) if phone == "+14155551234"));
}

#[test]
fn phone_without_digits_is_rejected() {
    let store = store();
    let err = store.users().create(1, user("call me")).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::Core);
}

#[test]
fn list_orders_by_registration() {
    let store = store();
    let late = store.users().create(20, user("+14155550002")).expect("late");
    let early = store.users().create(10, user("+14155550001")).expect("early");

    let listed = store.users().list().expect("list");
    let ids: Vec<_> = listed.iter().map(|user| user.id).collect();
    assert_eq!(ids, vec![early.id, late.id]);
}

#[test]
fn delete_removes_user() {
    let store = store();
    let created = store.users().create(1, user("+14155551234")).expect("create");
    store.users().delete(created.id).expect("delete");
    assert!(store.users().get(created.id).expect("get").is_none());

    let err = store.users().delete(created.id).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[test]
fn exact_lookup_matches_verbatim_tokens() {
    let store = store();
    let ada = store.users().create(1, user("+14155551234")).expect("ada");
    store.users().create(2, user("03001234567")).expect("bilal");

    let found = store
        .users()
        .find_by_exact_phones(&[
            "14155551234".to_string(),
            "+14155551234".to_string(),
            "+14155551234".to_string(),
        ])
        .expect("lookup");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ada.id);

    assert!(store
        .users()
        .find_by_exact_phones(&[])
        .expect("empty lookup")
        .is_empty());
}

#[test]
fn pattern_lookup_is_aligned_and_limited() {
    let store = store();
    let first = store.users().create(1, user("+14155550001")).expect("first");
    let second = store.users().create(2, user("+14155550002")).expect("second");
    let german = store.users().create(3, user("+4915112345678")).expect("german");

    let found = store
        .users()
        .find_by_phone_patterns(
            &[
                "4155550".to_string(),
                "95112345678".to_string(),
                "7777777".to_string(),
            ],
            1,
        )
        .expect("patterns");
    assert_eq!(found.len(), 3);
    assert_eq!(found[0].iter().map(|u| u.id).collect::<Vec<_>>(), vec![first.id]);
    // only the last ten digits overlap
    assert_eq!(found[1].iter().map(|u| u.id).collect::<Vec<_>>(), vec![german.id]);
    assert!(found[2].is_empty());

    let both = store
        .users()
        .find_by_phone_pattern("4155550", 10)
        .expect("pattern");
    assert_eq!(
        both.iter().map(|u| u.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
}
