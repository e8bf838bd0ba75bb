//! Port interface for zone persistence, plus an in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::geometry::Rect;
use crate::zone::{OccupancyInterval, Zone, ZoneId, ZoneSnapshot};

/// Errors reported by a [`ZoneStore`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("zone {0} not found")]
    NotFound(ZoneId),

    /// Backend unreachable or failing.
    #[error("zone store unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the write.
    #[error("zone store rejected the request: {0}")]
    Rejected(String),
}

/// Persistence collaborator owning the zone records.
///
/// Every call may be slow or fail; callers treat failures as lost writes
/// rather than fatal errors.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// All zones currently stored.
    async fn list_zones(&self) -> Result<ZoneSnapshot, StoreError>;

    async fn get_zone(&self, id: ZoneId) -> Result<Zone, StoreError>;

    /// Store a new, unconfirmed zone and return its id.
    async fn create_zone(&self, name: &str, rect: Rect) -> Result<ZoneId, StoreError>;

    async fn confirm_zone(&self, id: ZoneId) -> Result<(), StoreError>;

    async fn delete_zone(&self, id: ZoneId) -> Result<(), StoreError>;

    /// Append a completed occupancy interval to a zone's history.
    async fn append_interval(
        &self,
        id: ZoneId,
        interval: OccupancyInterval,
    ) -> Result<(), StoreError>;
}

/// [`ZoneStore`] kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryZoneStore {
    zones: RwLock<BTreeMap<ZoneId, Zone>>,
}

impl InMemoryZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zones(zones: impl IntoIterator<Item = Zone>) -> Self {
        Self {
            zones: RwLock::new(zones.into_iter().map(|z| (z.id, z)).collect()),
        }
    }

    /// Seed from raw zone records; malformed records are skipped.
    pub fn from_records(records: &[serde_json::Value]) -> Self {
        Self::with_zones(ZoneSnapshot::from_records(records).iter().cloned())
    }
}

#[async_trait]
impl ZoneStore for InMemoryZoneStore {
    async fn list_zones(&self) -> Result<ZoneSnapshot, StoreError> {
        let zones = self.zones.read().await;
        Ok(ZoneSnapshot::from_zones(zones.values().cloned()))
    }

    async fn get_zone(&self, id: ZoneId) -> Result<Zone, StoreError> {
        self.zones
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn create_zone(&self, name: &str, rect: Rect) -> Result<ZoneId, StoreError> {
        if !rect.is_valid() {
            return Err(StoreError::Rejected(format!(
                "rectangle {rect:?} must have positive dimensions"
            )));
        }
        let id = ZoneId::new();
        self.zones
            .write()
            .await
            .insert(id, Zone::proposed(id, name, rect));
        debug!(zone_id = %id, name, "Zone created");
        Ok(id)
    }

    async fn confirm_zone(&self, id: ZoneId) -> Result<(), StoreError> {
        let mut zones = self.zones.write().await;
        let zone = zones.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        zone.confirmed = true;
        Ok(())
    }

    async fn delete_zone(&self, id: ZoneId) -> Result<(), StoreError> {
        self.zones
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn append_interval(
        &self,
        id: ZoneId,
        interval: OccupancyInterval,
    ) -> Result<(), StoreError> {
        if interval.end < interval.start {
            return Err(StoreError::Rejected(format!(
                "interval ends at {} before it starts at {}",
                interval.end, interval.start
            )));
        }
        let mut zones = self.zones.write().await;
        let zone = zones.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        zone.intervals.push(interval);
        Ok(())
    }
}

/// Occupancy history of one zone, as shown in utilisation reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneReport {
    pub id: ZoneId,
    pub name: String,
    #[serde(rename = "times")]
    pub intervals: Vec<OccupancyInterval>,
}

impl ZoneReport {
    pub async fn fetch<S: ZoneStore + ?Sized>(store: &S, id: ZoneId) -> Result<Self, StoreError> {
        let zone = store.get_zone(id).await?;
        Ok(Self {
            id: zone.id,
            name: zone.name,
            intervals: zone.intervals,
        })
    }
}
