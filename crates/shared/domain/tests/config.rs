use kw_domain::config::{ApiConfig, DatabaseConfig, ServerConfig, SessionConfig, StorageConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4583);
    assert!(server.ssl.is_none());

    let session = SessionConfig::default();
    assert_eq!(session.idle_timeout_seconds, 1800);

    let db = DatabaseConfig::default();
    assert_eq!(db.snapshot, "inventory.snapshot");
    assert!(db.flush_interval_seconds > 0);

    let storage = StorageConfig::default();
    assert!(storage.compression);

    let cfg = ApiConfig::default();
    assert_eq!(cfg.security.admin.user_name, "admin");
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn api_config_deserializes_partial_sections() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "security": { "session": { "idle_timeout_seconds": 60 } },
        "storage": { "data_dir": "/tmp/kuwaiba" },
        "attachments": { "max_size_bytes": 1024 }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.security.session.idle_timeout_seconds, 60);
    assert_eq!(cfg.security.session.cache_capacity, 10_000);
    assert_eq!(cfg.storage.data_dir, std::path::PathBuf::from("/tmp/kuwaiba"));
    assert_eq!(cfg.attachments.max_size_bytes, 1024);
    assert_eq!(cfg.audit.max_entries, 100_000);
}

#[test]
fn config_is_copy_on_write() {
    let original = ApiConfig::default();
    let mut changed = original.clone();
    changed.server.port = 9000;
    assert_eq!(original.server.port, 4583);
    assert_eq!(changed.server.port, 9000);
}
