use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::Timestamp;
use crate::zone::{OccupancyInterval, ZoneId, ZoneSnapshot};

/// Track currently holding a zone and when it took it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyEntry {
    pub track_id: u64,
    pub since: Timestamp,
}

/// An occupancy interval that just ended and should be persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedInterval {
    pub zone_id: ZoneId,
    pub track_id: u64,
    pub interval: OccupancyInterval,
}

/// Per-zone Vacant / Occupied state machine over confirmed zones.
///
/// A zone is hit by a track when the track center lies inside the zone
/// rectangle (half-open). The current occupant keeps the zone for as long as
/// it still hits; otherwise the lowest hitting track id takes over. Every
/// change of occupant, and every Occupied -> Vacant transition, closes the
/// running interval at `now`.
///
/// Entries are cleared before the closed interval is handed out, so a lost
/// persistence write never leaves a zone stuck in Occupied.
#[derive(Debug, Clone, Default)]
pub struct OccupancyStateMachine {
    entries: BTreeMap<ZoneId, OccupancyEntry>,
}

impl OccupancyStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every confirmed zone by one frame.
    ///
    /// `centers` holds the `(track_id, (x, y))` center of every confirmed
    /// track in this frame. Returns the intervals closed by this frame, in
    /// zone id order.
    pub fn update(
        &mut self,
        zones: &ZoneSnapshot,
        centers: &[(u64, (f32, f32))],
        now: Timestamp,
    ) -> Vec<ClosedInterval> {
        let mut closed = Vec::new();

        for zone in zones.confirmed() {
            let hits = |track_id: u64| {
                centers
                    .iter()
                    .any(|&(id, (x, y))| id == track_id && zone.rect.contains_point(x, y))
            };
            let first_hit = centers
                .iter()
                .filter(|(_, (x, y))| zone.rect.contains_point(*x, *y))
                .map(|(id, _)| *id)
                .min();

            let occupant = match self.entries.get(&zone.id) {
                Some(entry) if hits(entry.track_id) => continue,
                Some(entry) => Some(*entry),
                None => None,
            };

            if let Some(entry) = occupant {
                self.entries.remove(&zone.id);
                let interval = OccupancyInterval::new(entry.since, now);
                info!(
                    zone_id = %zone.id,
                    track_id = entry.track_id,
                    start = interval.start,
                    end = interval.end,
                    "Zone occupancy ended"
                );
                closed.push(ClosedInterval {
                    zone_id: zone.id,
                    track_id: entry.track_id,
                    interval,
                });
            }

            if let Some(track_id) = first_hit {
                info!(zone_id = %zone.id, track_id, start = now, "Zone occupied");
                self.entries.insert(
                    zone.id,
                    OccupancyEntry {
                        track_id,
                        since: now,
                    },
                );
            }
        }

        closed
    }

    /// Drop entries for zones that are gone or no longer confirmed.
    ///
    /// Replacing the snapshot with an identical one changes nothing.
    pub fn reconcile(&mut self, zones: &ZoneSnapshot) -> usize {
        let before = self.entries.len();
        self.entries.retain(|zone_id, entry| {
            let keep = zones.get(zone_id).is_some_and(|z| z.confirmed);
            if !keep {
                debug!(
                    zone_id = %zone_id,
                    track_id = entry.track_id,
                    "Dropping occupancy of removed zone"
                );
            }
            keep
        });
        before - self.entries.len()
    }

    pub fn occupant(&self, zone_id: &ZoneId) -> Option<&OccupancyEntry> {
        self.entries.get(zone_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ZoneId, &OccupancyEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::zone::Zone;

    fn confirmed_zone(rect: Rect) -> Zone {
        let mut zone = Zone::proposed(ZoneId::new(), "desk", rect);
        zone.confirmed = true;
        zone
    }

    fn snapshot_with(zone: &Zone) -> ZoneSnapshot {
        ZoneSnapshot::from_zones([zone.clone()])
    }

    #[test]
    fn test_enter_then_leave_records_one_interval() {
        let zone = confirmed_zone(Rect::new(100.0, 100.0, 75.0, 75.0));
        let zones = snapshot_with(&zone);
        let mut machine = OccupancyStateMachine::new();

        for t in [1.0, 2.0, 3.0] {
            assert!(machine.update(&zones, &[(7, (120.0, 120.0))], t).is_empty());
        }
        assert_eq!(machine.occupant(&zone.id).unwrap().since, 1.0);

        let closed = machine.update(&zones, &[(7, (400.0, 400.0))], 4.0);
        assert_eq!(
            closed,
            vec![ClosedInterval {
                zone_id: zone.id,
                track_id: 7,
                interval: OccupancyInterval::new(1.0, 4.0),
            }]
        );
        assert!(machine.occupant(&zone.id).is_none());

        // Vacant stays vacant without emitting anything.
        assert!(machine.update(&zones, &[], 5.0).is_empty());
    }

    #[test]
    fn test_track_disappearing_closes_interval() {
        let zone = confirmed_zone(Rect::new(0.0, 0.0, 50.0, 50.0));
        let zones = snapshot_with(&zone);
        let mut machine = OccupancyStateMachine::new();

        machine.update(&zones, &[(1, (10.0, 10.0))], 10.0);
        let closed = machine.update(&zones, &[], 12.5);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].interval, OccupancyInterval::new(10.0, 12.5));
    }

    #[test]
    fn test_handover_closes_before_opening() {
        let zone = confirmed_zone(Rect::new(0.0, 0.0, 50.0, 50.0));
        let zones = snapshot_with(&zone);
        let mut machine = OccupancyStateMachine::new();

        machine.update(&zones, &[(5, (10.0, 10.0))], 1.0);
        let closed = machine.update(&zones, &[(5, (90.0, 90.0)), (9, (20.0, 20.0))], 2.0);

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].track_id, 5);
        assert_eq!(closed[0].interval, OccupancyInterval::new(1.0, 2.0));
        assert_eq!(
            machine.occupant(&zone.id),
            Some(&OccupancyEntry {
                track_id: 9,
                since: 2.0
            })
        );
    }

    #[test]
    fn test_incumbent_keeps_zone_and_lowest_id_wins_when_vacant() {
        let zone = confirmed_zone(Rect::new(0.0, 0.0, 50.0, 50.0));
        let zones = snapshot_with(&zone);
        let mut machine = OccupancyStateMachine::new();

        machine.update(&zones, &[(8, (10.0, 10.0)), (3, (30.0, 30.0))], 1.0);
        assert_eq!(machine.occupant(&zone.id).unwrap().track_id, 3);

        machine.update(&zones, &[(3, (30.0, 30.0)), (1, (40.0, 40.0))], 2.0);
        assert_eq!(machine.occupant(&zone.id).unwrap().track_id, 3);
    }

    #[test]
    fn test_unconfirmed_zones_are_ignored() {
        let zone = Zone::proposed(ZoneId::new(), "maybe", Rect::new(0.0, 0.0, 50.0, 50.0));
        let zones = snapshot_with(&zone);
        let mut machine = OccupancyStateMachine::new();

        machine.update(&zones, &[(1, (10.0, 10.0))], 1.0);
        assert!(machine.is_empty());
    }

    #[test]
    fn test_zone_edge_is_half_open() {
        let zone = confirmed_zone(Rect::new(100.0, 100.0, 75.0, 75.0));
        let zones = snapshot_with(&zone);
        let mut machine = OccupancyStateMachine::new();

        machine.update(&zones, &[(1, (175.0, 120.0))], 1.0);
        assert!(machine.is_empty());
        machine.update(&zones, &[(1, (100.0, 100.0))], 2.0);
        assert_eq!(machine.len(), 1);
    }

    #[test]
    fn test_reconcile_drops_removed_zones_only() {
        let kept = confirmed_zone(Rect::new(0.0, 0.0, 50.0, 50.0));
        let removed = confirmed_zone(Rect::new(200.0, 0.0, 50.0, 50.0));
        let zones = ZoneSnapshot::from_zones([kept.clone(), removed.clone()]);
        let mut machine = OccupancyStateMachine::new();

        machine.update(&zones, &[(1, (10.0, 10.0)), (2, (210.0, 10.0))], 1.0);
        assert_eq!(machine.len(), 2);

        // Identical snapshot: no change.
        assert_eq!(machine.reconcile(&zones), 0);
        assert_eq!(machine.len(), 2);

        let remaining = ZoneSnapshot::from_zones([kept.clone()]);
        assert_eq!(machine.reconcile(&remaining), 1);
        assert!(machine.occupant(&kept.id).is_some());
        assert!(machine.occupant(&removed.id).is_none());
    }

    #[test]
    fn test_reoccupation_after_vacancy() {
        let zone = confirmed_zone(Rect::new(0.0, 0.0, 50.0, 50.0));
        let zones = snapshot_with(&zone);
        let mut machine = OccupancyStateMachine::new();

        machine.update(&zones, &[(1, (10.0, 10.0))], 1.0);
        machine.update(&zones, &[], 2.0);
        machine.update(&zones, &[(1, (10.0, 10.0))], 3.0);
        let closed = machine.update(&zones, &[], 6.0);
        assert_eq!(closed[0].interval, OccupancyInterval::new(3.0, 6.0));
    }
}
