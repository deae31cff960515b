use std::fs;

use wardboard_presence::identity::IdentityStore;
use wardboard_presence::types::SessionId;

#[test]
fn creates_and_persists_a_session_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session-id");
    let store = IdentityStore::new(&path);

    let id = store.get_or_create().expect("create id");
    assert!(SessionId::is_well_formed(id.as_str()));
    assert!(path.exists(), "id must be durably persisted");

    let again = store.get_or_create().expect("cached id");
    assert_eq!(again, id, "the id is stable after the first call");
}

#[test]
fn reloads_the_persisted_id_across_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session-id");

    let first = IdentityStore::new(&path).get_or_create().expect("create");
    let second = IdentityStore::new(&path).get_or_create().expect("reload");
    assert_eq!(second, first, "a reload must pick up the same session id");
}

#[test]
fn corrupt_persisted_id_is_discarded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session-id");
    fs::write(&path, "definitely not an id\u{7f}").expect("write corrupt id");

    let store = IdentityStore::new(&path);
    let id = store.get_or_create().expect("regenerate");
    assert!(SessionId::is_well_formed(id.as_str()));

    let persisted = fs::read_to_string(&path).expect("read back");
    assert_eq!(persisted.trim(), id.as_str(), "the fresh id replaces the corrupt one");
}

#[test]
fn clear_forces_a_fresh_id_on_next_use() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session-id");
    let store = IdentityStore::new(&path);

    let first = store.get_or_create().expect("create");
    store.clear().expect("clear");
    assert!(!path.exists());

    let second = store.get_or_create().expect("recreate");
    assert_ne!(second, first);
}

#[test]
fn clear_on_a_missing_file_is_fine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = IdentityStore::new(dir.path().join("never-written"));
    store.clear().expect("clear on absent file");
}

#[test]
fn creates_parent_directories_on_first_persist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/state/session-id");
    let store = IdentityStore::new(&path);

    let id = store.get_or_create().expect("create");
    assert!(path.exists());
    assert!(SessionId::is_well_formed(id.as_str()));
}
