use tempfile::tempdir;
use voice_chat_store::store::keys;
use voice_chat_store::{KeyValueStore, SledStore};

#[tokio::test]
async fn test_set_get_remove() {
    let store = SledStore::temporary().unwrap();

    assert_eq!(store.get_item(keys::CONVERSATIONS).await.unwrap(), None);
    store.set_item(keys::CONVERSATIONS, "[]".to_string()).await.unwrap();
    assert_eq!(store.get_item(keys::CONVERSATIONS).await.unwrap().as_deref(), Some("[]"));

    store.set_item(keys::CONVERSATIONS, "[1]".to_string()).await.unwrap();
    assert_eq!(store.get_item(keys::CONVERSATIONS).await.unwrap().as_deref(), Some("[1]"));

    store.remove_item(keys::CONVERSATIONS).await.unwrap();
    assert_eq!(store.get_item(keys::CONVERSATIONS).await.unwrap(), None);
    // Removing again is fine
    store.remove_item(keys::CONVERSATIONS).await.unwrap();
}

#[tokio::test]
async fn test_values_persist_across_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = SledStore::open(dir.path()).unwrap();
        store.set_item(keys::REPLIES, "{\"a\":[]}".to_string()).await.unwrap();
    }

    let store = SledStore::open(dir.path()).unwrap();
    assert_eq!(store.get_item(keys::REPLIES).await.unwrap().as_deref(), Some("{\"a\":[]}"));
    assert!(store.size_on_disk().unwrap() > 0);
}

#[tokio::test]
async fn test_usable_as_trait_object() {
    let store: Box<dyn KeyValueStore> = Box::new(SledStore::temporary().unwrap());
    store.set_item("k", "v".to_string()).await.unwrap();
    assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v"));
}
