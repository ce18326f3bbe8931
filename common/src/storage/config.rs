//! Storage backend configuration.
//!
//! These types are deserialized from the `storage` section of a config file:
//!
//! ```toml
//! [storage]
//! type = "SlateDb"
//! path = "idgen"
//!
//! [storage.object_store]
//! type = "Local"
//! path = "/var/lib/idgen"
//! ```

use serde::{Deserialize, Serialize};

/// Selects the storage backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StorageConfig {
    /// Process-local storage; contents are lost when the process exits.
    #[default]
    InMemory,
    /// SlateDB on top of an object store.
    SlateDb(SlateDbStorageConfig),
}

/// Settings for a SlateDB-backed storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlateDbStorageConfig {
    /// Path prefix of the database within the object store.
    pub path: String,
    /// Object store holding the database.
    pub object_store: ObjectStoreConfig,
    /// Optional SlateDB settings file. When absent, settings are loaded from
    /// the environment or fall back to SlateDB defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<String>,
}

/// Selects the object store backing a SlateDB database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectStoreConfig {
    #[default]
    InMemory,
    Aws(AwsObjectStoreConfig),
    Local(LocalObjectStoreConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsObjectStoreConfig {
    pub region: String,
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectStoreConfig {
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_in_memory() {
        // given/when
        let config = StorageConfig::default();

        // then
        assert_eq!(config, StorageConfig::InMemory);
    }

    #[test]
    fn should_parse_in_memory_config() {
        // given
        let toml = r#"type = "InMemory""#;

        // when
        let config: StorageConfig = toml::from_str(toml).unwrap();

        // then
        assert_eq!(config, StorageConfig::InMemory);
    }

    #[test]
    fn should_parse_slatedb_config_with_local_object_store() {
        // given
        let toml = r#"
            type = "SlateDb"
            path = "counters"

            [object_store]
            type = "Local"
            path = "/tmp/idgen"
        "#;

        // when
        let config: StorageConfig = toml::from_str(toml).unwrap();

        // then
        assert_eq!(
            config,
            StorageConfig::SlateDb(SlateDbStorageConfig {
                path: "counters".to_string(),
                object_store: ObjectStoreConfig::Local(LocalObjectStoreConfig {
                    path: "/tmp/idgen".to_string(),
                }),
                settings_path: None,
            })
        );
    }

    #[test]
    fn should_parse_slatedb_config_with_aws_object_store() {
        // given
        let toml = r#"
            type = "SlateDb"
            path = "counters"
            settings_path = "slatedb.toml"

            [object_store]
            type = "Aws"
            region = "ap-south-1"
            bucket = "ids"
        "#;

        // when
        let config: StorageConfig = toml::from_str(toml).unwrap();

        // then
        let StorageConfig::SlateDb(slate) = config else {
            panic!("expected SlateDb config");
        };
        assert_eq!(slate.settings_path.as_deref(), Some("slatedb.toml"));
        assert_eq!(
            slate.object_store,
            ObjectStoreConfig::Aws(AwsObjectStoreConfig {
                region: "ap-south-1".to_string(),
                bucket: "ids".to_string(),
            })
        );
    }

    #[test]
    fn should_reject_unknown_backend() {
        // given
        let toml = r#"type = "Dynamo""#;

        // when
        let result: Result<StorageConfig, _> = toml::from_str(toml);

        // then
        assert!(result.is_err());
    }
}
