//! Delivery counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Sink for delivery statistics.
pub trait StatsSink: Send + Sync {
    /// A packet was accepted by a live connection.
    fn incr_push(&self);

    /// A server-wide broadcast was issued.
    fn incr_broadcast(&self);

    /// A room broadcast was issued.
    fn incr_room_broadcast(&self);
}

/// Lock-free in-process counters.
#[derive(Debug, Default)]
pub struct Stats {
    push: AtomicU64,
    broadcast: AtomicU64,
    room_broadcast: AtomicU64,
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Packets accepted by live connections
    pub push: u64,
    /// Broadcast calls
    pub broadcast: u64,
    /// Room broadcast calls
    pub room_broadcast: u64,
}

impl Stats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all counters. Counters are read independently, so a snapshot
    /// taken under load may mix values from slightly different instants.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            push: self.push.load(Ordering::Relaxed),
            broadcast: self.broadcast.load(Ordering::Relaxed),
            room_broadcast: self.room_broadcast.load(Ordering::Relaxed),
        }
    }
}

impl StatsSink for Stats {
    fn incr_push(&self) {
        self.push.fetch_add(1, Ordering::Relaxed);
    }

    fn incr_broadcast(&self) {
        self.broadcast.fetch_add(1, Ordering::Relaxed);
    }

    fn incr_room_broadcast(&self) {
        self.room_broadcast.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent() {
        let stats = Stats::new();
        stats.incr_push();
        stats.incr_push();
        stats.incr_room_broadcast();

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot { push: 2, broadcast: 0, room_broadcast: 1 }
        );
    }
}
