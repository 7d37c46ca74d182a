//! Store configuration.
//!
//! Front ends pass this as JSON to [`crate::open_library`]; every field is
//! optional and falls back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

/// Slot holding the library record snapshot.
pub const LIBRARY_SLOT: &str = "libraryItems";
/// Slot holding the catalog item snapshot.
pub const CATALOG_SLOT: &str = "catalogItems";

const DEFAULT_NAME: &str = "library";
const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Environment name; the LMDB directory is `<name>.lmdb`.
    pub name: String,
    /// Key under which the collection snapshot is stored.
    pub slot: String,
    /// Maximum LMDB map size in bytes.
    pub map_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            slot: LIBRARY_SLOT.to_string(),
            map_size: DEFAULT_MAP_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    /// Parses and validates a JSON configuration. An empty string yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let config: StoreConfig = if json.trim().is_empty() {
            StoreConfig::default()
        } else {
            serde_json::from_str(json)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.name.trim().is_empty() {
            return Err(AppResponse::BadRequest("Store name cannot be empty".to_string()));
        }
        if self.slot.is_empty() {
            return Err(AppResponse::BadRequest("Snapshot slot cannot be empty".to_string()));
        }
        if self.map_size == 0 {
            return Err(AppResponse::BadRequest("map_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = StoreConfig::from_json(r#"{"name":"shelf"}"#).unwrap();
        assert_eq!(config.name, "shelf");
        assert_eq!(config.slot, LIBRARY_SLOT);
        assert_eq!(config.map_size, DEFAULT_MAP_SIZE);

        assert_eq!(StoreConfig::from_json("").unwrap(), StoreConfig::default());
    }

    #[test]
    fn builder_targets_catalog_slot() {
        let config = StoreConfig::named("books").with_slot(CATALOG_SLOT);
        assert_eq!(config.name, "books");
        assert_eq!(config.slot, CATALOG_SLOT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let err = StoreConfig::from_json(r#"{"name":"  "}"#).unwrap_err();
        assert!(matches!(err, AppResponse::BadRequest(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = StoreConfig::from_json("{name:").unwrap_err();
        assert!(matches!(err, AppResponse::SerializationError(_)));
    }
}
