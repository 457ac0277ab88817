//! Persistence of settings across restarts.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use twitch_tts::database::{
    file_store::JsonFileStore,
    settings::{ConfigSnapshot, Settings},
    store::ConfigStore,
};

#[tokio::test]
async fn test_settings_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("config.json");

    {
        let settings = Settings::new(Arc::new(JsonFileStore::open(&path).await.unwrap()));
        settings.ensure_defaults().await.unwrap();
        assert_eq!(settings.snapshot().await.unwrap(), ConfigSnapshot::default());

        assert!(settings.toggle_enabled().await.unwrap());
        settings.set_voice(Some("Alice")).await.unwrap();
        settings.set_volume(80).await.unwrap();
    }

    let settings = Settings::new(Arc::new(JsonFileStore::open(&path).await.unwrap()));
    settings.ensure_defaults().await.unwrap();

    let snapshot = settings.snapshot().await.unwrap();
    assert!(snapshot.enabled);
    assert_eq!(snapshot.voice, "Alice");
    assert_eq!(snapshot.volume, 80);
}

#[tokio::test]
async fn test_ensure_does_not_overwrite_existing_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    tokio::fs::write(&path, r#"{ "volume": 35 }"#).await.unwrap();

    let store = JsonFileStore::open(&path).await.unwrap();
    store.ensure("volume", json!(100)).await.unwrap();
    store.ensure("voice", json!("Microsoft Richard")).await.unwrap();

    assert_eq!(store.get("volume").await.unwrap(), Some(json!(35)));
    assert_eq!(
        store.get("voice").await.unwrap(),
        Some(json!("Microsoft Richard"))
    );
}

#[tokio::test]
async fn test_file_holds_plain_json_object() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let store = JsonFileStore::open(&path).await.unwrap();
    store.set("enabled", json!(true)).await.unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(value, json!({ "enabled": true }));
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_non_object_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    tokio::fs::write(&path, "[1, 2, 3]").await.unwrap();

    assert!(JsonFileStore::open(&path).await.is_err());
}
