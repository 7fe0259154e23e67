use parking_lot::Mutex;

use super::keypoint::PoseSnapshot;

struct Slot {
    seq: u64,
    snapshot: Option<PoseSnapshot>,
}

/// Latest pose published by the inference worker.
///
/// Single writer overwrites, the tick loop reads. Intermediate snapshots the
/// reader never saw are simply dropped.
pub struct LatestPose {
    slot: Mutex<Slot>,
}

impl LatestPose {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot { seq: 0, snapshot: None }),
        }
    }

    pub fn publish(&self, snapshot: PoseSnapshot) {
        let mut slot = self.slot.lock();
        slot.seq += 1;
        slot.snapshot = Some(snapshot);
    }

    /// Returns the snapshot only if one was published after `last_seen`,
    /// and advances `last_seen`. `None` means no new frame this tick.
    pub fn take_newer(&self, last_seen: &mut u64) -> Option<PoseSnapshot> {
        let slot = self.slot.lock();
        if slot.seq == *last_seen {
            return None;
        }
        *last_seen = slot.seq;
        slot.snapshot.clone()
    }
}

impl Default for LatestPose {
    fn default() -> Self {
        Self::new()
    }
}
