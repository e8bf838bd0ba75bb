//! Workplace zones and the per-session zone snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::Timestamp;
use crate::error::Error;
use crate::geometry::Rect;

/// Opaque, globally unique zone identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(Uuid);

impl ZoneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ZoneId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ZoneId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for ZoneId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A closed time range during which a zone was continuously occupied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupancyInterval {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl OccupancyInterval {
    /// Build an interval, clamping `end` so that `end >= start` always holds.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A workplace zone, proposed or confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    #[serde(rename = "bbox")]
    pub rect: Rect,
    #[serde(rename = "is_confirmed", default)]
    pub confirmed: bool,
    #[serde(rename = "times", default)]
    pub intervals: Vec<OccupancyInterval>,
}

impl Zone {
    /// A freshly proposed, unconfirmed zone with no history.
    pub fn proposed(id: ZoneId, name: impl Into<String>, rect: Rect) -> Self {
        Self {
            id,
            name: name.into(),
            rect,
            confirmed: false,
            intervals: Vec::new(),
        }
    }

    /// Parse one zone record, rejecting missing fields and degenerate rectangles.
    pub fn from_record(record: &serde_json::Value) -> Result<Self, Error> {
        let id = record
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>")
            .to_string();

        let zone: Zone =
            serde_json::from_value(record.clone()).map_err(|e| Error::MalformedZone {
                id: id.clone(),
                reason: e.to_string(),
            })?;

        if !zone.rect.is_valid() {
            return Err(Error::MalformedZone {
                id,
                reason: format!("rectangle {:?} must have positive dimensions", zone.rect),
            });
        }
        if zone.intervals.iter().any(|i| i.end < i.start) {
            return Err(Error::MalformedZone {
                id,
                reason: "interval ends before it starts".to_string(),
            });
        }
        Ok(zone)
    }
}

/// Read-only view of all zones known to a session, keyed (and ordered) by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneSnapshot {
    zones: BTreeMap<ZoneId, Zone>,
}

impl ZoneSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_zones(zones: impl IntoIterator<Item = Zone>) -> Self {
        Self {
            zones: zones.into_iter().map(|z| (z.id, z)).collect(),
        }
    }

    /// Build a snapshot from raw zone records, skipping malformed ones.
    pub fn from_records(records: &[serde_json::Value]) -> Self {
        let mut zones = BTreeMap::new();
        for record in records {
            match Zone::from_record(record) {
                Ok(zone) => {
                    zones.insert(zone.id, zone);
                }
                Err(e) => warn!(error = %e, "Skipping malformed zone record"),
            }
        }
        Self { zones }
    }

    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.get(id)
    }

    pub fn contains(&self, id: &ZoneId) -> bool {
        self.zones.contains_key(id)
    }

    /// All zones in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Confirmed zones in ascending id order.
    pub fn confirmed(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values().filter(|z| z.confirmed)
    }

    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.zones.values().map(|z| z.rect)
    }

    pub fn insert(&mut self, zone: Zone) {
        self.zones.insert(zone.id, zone);
    }

    pub fn remove(&mut self, id: &ZoneId) -> Option<Zone> {
        self.zones.remove(id)
    }

    pub fn get_mut(&mut self, id: &ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
