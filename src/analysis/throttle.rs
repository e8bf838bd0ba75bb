use std::collections::BTreeMap;

use crate::Timestamp;

/// Rate limit on proposals per track id.
#[derive(Debug, Clone, Default)]
pub struct ProposalThrottle {
    last_proposal: BTreeMap<u64, Timestamp>,
}

impl ProposalThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `track_id` may propose at `now` given the cooldown.
    pub fn allows(&self, track_id: u64, now: Timestamp, cooldown: f64) -> bool {
        match self.last_proposal.get(&track_id) {
            Some(&last) => now - last >= cooldown,
            None => true,
        }
    }

    /// Check the cooldown and, if it has passed, record a proposal at `now`.
    pub fn try_acquire(&mut self, track_id: u64, now: Timestamp, cooldown: f64) -> bool {
        if !self.allows(track_id, now, cooldown) {
            return false;
        }
        self.last_proposal.insert(track_id, now);
        true
    }

    pub fn last_proposal(&self, track_id: u64) -> Option<Timestamp> {
        self.last_proposal.get(&track_id).copied()
    }

    /// Drop records whose cooldown has already run out.
    pub fn expire(&mut self, now: Timestamp, cooldown: f64) {
        self.last_proposal.retain(|_, last| now - *last < cooldown);
    }

    pub fn len(&self) -> usize {
        self.last_proposal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_proposal.is_empty()
    }
}
