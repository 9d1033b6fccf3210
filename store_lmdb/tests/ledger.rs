use std::sync::Arc;
use std::thread;

use stakegov_store::{GovernanceStore, InsertOutcome, MetaStore};
use stakegov_store_lmdb::migration::CURRENT_SCHEMA_VERSION;
use stakegov_store_lmdb::LmdbEnvironment;
use stakegov_types::{Amount, GovernanceEntry, Timestamp, VoteId};

fn entry(id: &str, weight: u64) -> GovernanceEntry {
    GovernanceEntry {
        vote_id: VoteId::new(id).unwrap(),
        weight: Amount::new(weight),
        recorded_at: Timestamp::new(1_700_000_000),
    }
}

#[test]
fn insert_get_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open_default(dir.path()).unwrap();
    let store = env.governance_store();

    assert!(!store.exists(&VoteId::new("prop-7").unwrap()).unwrap());
    assert_eq!(store.insert_entry(&entry("prop-7", 50)).unwrap(), InsertOutcome::Inserted);
    assert_eq!(store.insert_entry(&entry("prop-1", 5)).unwrap(), InsertOutcome::Inserted);

    let got = store.get_entry(&VoteId::new("prop-7").unwrap()).unwrap();
    assert_eq!(got, Some(entry("prop-7", 50)));

    let ids: Vec<String> = store
        .list_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.vote_id.to_string())
        .collect();
    assert_eq!(ids, vec!["prop-1", "prop-7"]);
}

#[test]
fn duplicate_insert_keeps_first_entry() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open_default(dir.path()).unwrap();
    let store = env.governance_store();

    store.insert_entry(&entry("prop-7", 50)).unwrap();
    assert!(store.exists(&VoteId::new("prop-7").unwrap()).unwrap());
    assert_eq!(
        store.insert_entry(&entry("prop-7", 999)).unwrap(),
        InsertOutcome::Existing(entry("prop-7", 50))
    );
    assert_eq!(store.list_entries().unwrap().len(), 1);
}

#[test]
fn concurrent_inserts_admit_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open_default(dir.path()).unwrap();
    let store = Arc::new(env.governance_store());

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.insert_entry(&entry("prop-race", i + 1)).unwrap())
        })
        .collect();
    let inserted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|o| *o == InsertOutcome::Inserted)
        .count();
    assert_eq!(inserted, 1);
}

#[test]
fn erase_all_reports_count_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = LmdbEnvironment::open_default(dir.path()).unwrap();
        let store = env.governance_store();
        store.insert_entry(&entry("a", 1)).unwrap();
        store.insert_entry(&entry("b", 2)).unwrap();
        store.insert_entry(&entry("c", 3)).unwrap();
    }
    let env = LmdbEnvironment::open_default(dir.path()).unwrap();
    let store = env.governance_store();
    assert_eq!(store.list_entries().unwrap().len(), 3);
    assert_eq!(store.erase_all().unwrap(), 3);
    assert_eq!(store.erase_all().unwrap(), 0);
    assert!(store.list_entries().unwrap().is_empty());
}

#[test]
fn schema_version_stamped_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open_default(dir.path()).unwrap();
    assert_eq!(
        env.meta_store().get_schema_version().unwrap(),
        CURRENT_SCHEMA_VERSION
    );
}

#[test]
fn newer_schema_refuses_to_open() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = LmdbEnvironment::open_default(dir.path()).unwrap();
        env.meta_store()
            .set_schema_version(CURRENT_SCHEMA_VERSION + 1)
            .unwrap();
    }
    assert!(LmdbEnvironment::open_default(dir.path()).is_err());
}
