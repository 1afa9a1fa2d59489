//! Static Catalog
//!
//! Implements `ReferenceDataProvider` from a fixed list, optionally loaded
//! from a JSON file.

use crate::domain::{Location, ServiceOffering, StoreError};
use crate::ports::outbound::ReferenceDataProvider;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Catalog load errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    /// File is not a valid catalog.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    services: Vec<Entry<ServiceOffering>>,
    #[serde(default)]
    locations: Vec<Entry<Location>>,
}

#[derive(Debug, Deserialize)]
struct Entry<T> {
    #[serde(flatten)]
    item: T,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

/// Fixed reference data.
#[derive(Clone, Debug)]
pub struct StaticCatalog {
    services: Vec<ServiceOffering>,
    locations: Vec<Location>,
}

impl StaticCatalog {
    /// Catalog of exactly these entries.
    pub fn new(services: Vec<ServiceOffering>, locations: Vec<Location>) -> Self {
        Self {
            services,
            locations,
        }
    }

    /// Parse `{"services": [...], "locations": [...]}`.
    ///
    /// Entries with `"active": false` are dropped.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(Self {
            services: file
                .services
                .into_iter()
                .filter(|e| e.active)
                .map(|e| e.item)
                .collect(),
            locations: file
                .locations
                .into_iter()
                .filter(|e| e.active)
                .map(|e| e.item)
                .collect(),
        })
    }

    /// Load from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        let service = |id: &str, name: &str, minutes| ServiceOffering {
            id: id.into(),
            display_name: name.into(),
            duration_minutes: minutes,
        };
        let location = |id: &str, name: &str, address: &str| Location {
            id: id.into(),
            display_name: name.into(),
            address: address.into(),
        };

        Self::new(
            vec![
                service("consultation", "Consultation", 30),
                service("follow_up", "Follow-up Visit", 20),
                service("full_session", "Full Session", 60),
            ],
            vec![
                location("downtown", "Downtown Office", "100 Main Street"),
                location("uptown", "Uptown Office", "200 Park Avenue"),
            ],
        )
    }
}

#[async_trait]
impl ReferenceDataProvider for StaticCatalog {
    async fn list_active_services(&self) -> Result<Vec<ServiceOffering>, StoreError> {
        Ok(self.services.clone())
    }

    async fn list_active_locations(&self) -> Result<Vec<Location>, StoreError> {
        Ok(self.locations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_drops_inactive_entries() {
        let catalog = StaticCatalog::from_json_str(
            r#"{
                "services": [
                    { "id": "haircut", "display_name": "Haircut", "duration_minutes": 30 },
                    { "id": "perm", "display_name": "Perm", "duration_minutes": 90, "active": false }
                ],
                "locations": [
                    { "id": "downtown", "display_name": "Downtown Studio" }
                ]
            }"#,
        )
        .unwrap();

        let services = catalog.list_active_services().await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].id, "haircut");

        let locations = catalog.list_active_locations().await.unwrap();
        assert_eq!(locations[0].address, "");
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            StaticCatalog::from_json_str("{ nope"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            StaticCatalog::from_path("/nonexistent/catalog.json"),
            Err(CatalogError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_default_catalog_is_not_empty() {
        let catalog = StaticCatalog::default();
        assert!(!catalog.list_active_services().await.unwrap().is_empty());
        assert!(!catalog.list_active_locations().await.unwrap().is_empty());
    }
}
