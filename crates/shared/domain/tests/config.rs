use cape_domain::config::{ApiConfig, DatabaseConfig, HeroesConfig, LoggingConfig, ServerConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 5555);
    assert!(server.address.is_unspecified());
    assert!(server.ssl.is_none());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "sqlite::memory:");
    assert_eq!(db.max_connections, 5);
    assert!(!db.seed);

    assert_eq!(HeroesConfig::default().max_depth, 8);

    let logging = LoggingConfig::default();
    assert_eq!(logging.level, "info");
    assert_eq!(logging.format, "compact");
    assert!(logging.directory.is_none());
}

#[test]
fn api_config_deserializes_partial_sections() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "database": { "url": "sqlite://heroes.db", "seed": true },
        "logging": { "format": "json" }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");

    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.database.url, "sqlite://heroes.db");
    assert_eq!(cfg.database.max_connections, 5);
    assert!(cfg.database.seed);
    assert_eq!(cfg.heroes.max_depth, 8);
    assert_eq!(cfg.logging.format, "json");
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn mutating_a_clone_leaves_the_original_untouched() {
    let original = ApiConfig::default();
    let mut copy = original.clone();

    copy.server.port = 9999;

    assert_eq!(original.server.port, 5555);
    assert_eq!(copy.server.port, 9999);
}
