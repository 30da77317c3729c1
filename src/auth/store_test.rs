use super::*;

#[test]
fn init_restores_persisted_token() {
    let store = TokenStore::init(MemoryStorage::with_token("abc.def.ghi"));
    assert_eq!(store.token().as_deref(), Some("abc.def.ghi"));
    assert!(store.has_token());
}

#[test]
fn init_treats_blank_persisted_token_as_absent() {
    let store = TokenStore::init(MemoryStorage::with_token("   "));
    assert_eq!(store.token(), None);
}

#[test]
fn set_overwrites_and_persists() {
    let store = TokenStore::init(MemoryStorage::with_token("old"));
    store.set("new");
    assert_eq!(store.token().as_deref(), Some("new"));
    let backend = store.teardown();
    assert_eq!(backend.load().as_deref(), Some("new"));
}

#[test]
fn clear_removes_from_memory_and_backend() {
    let store = TokenStore::init(MemoryStorage::with_token("tok"));
    store.clear();
    assert!(!store.has_token());
    assert_eq!(store.teardown().load(), None);
}

#[test]
fn teardown_keeps_persisted_token_for_next_session() {
    let store = TokenStore::init(MemoryStorage::new());
    store.set("carried");
    let reopened = TokenStore::from_boxed(store.teardown());
    assert_eq!(reopened.token().as_deref(), Some("carried"));
}

#[test]
fn debug_output_hides_token() {
    let store = TokenStore::init(MemoryStorage::with_token("secret.value.here"));
    let out = format!("{store:?}");
    assert!(out.contains("has_token: true"));
    assert!(!out.contains("secret"));
}

#[cfg(feature = "native")]
mod file_storage {
    use super::*;

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("token"));
        assert_eq!(storage.load(), None);
    }

    #[test]
    fn save_creates_parent_dirs_and_load_trims() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("token");
        let storage = FileStorage::new(&path);
        storage.save("a.b.c");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a.b.c");

        std::fs::write(&path, "a.b.c\n").unwrap();
        assert_eq!(storage.load().as_deref(), Some("a.b.c"));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("token"));
        storage.save("x.y.z");
        storage.remove();
        storage.remove();
        assert_eq!(storage.load(), None);
    }

    #[test]
    fn store_survives_reopen_through_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("token");
        TokenStore::init(FileStorage::new(&path)).set("persisted.tok.en");
        let reopened = TokenStore::init(FileStorage::new(&path));
        assert_eq!(reopened.token().as_deref(), Some("persisted.tok.en"));
    }

    #[test]
    fn failed_persist_keeps_memory_slot_authoritative() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = TokenStore::init(FileStorage::new(blocker.join("token")));

        store.set("kept.in.memory");
        assert_eq!(store.token().as_deref(), Some("kept.in.memory"));
        store.clear();
        assert!(!store.has_token());
        assert_eq!(store.teardown().load(), None);
    }
}
