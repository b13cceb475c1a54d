//! One shard of the connection registry.
//!
//! A bucket maps session keys to connection handles and rooms to the keys of
//! their members. Membership is tracked in both directions so a connection
//! leaving removes it from its room without scanning.
//!
//! All mutation happens under the bucket's own write lock. Deliveries never
//! happen under the lock: fan-out takes a snapshot of the handles, releases
//! the lock, then delivers.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use comet_proto::{Packet, operation::NO_ROOM};
use parking_lot::RwLock;

use crate::channel::ConnectionHandle;

/// Shared handle to a registered connection.
pub type Handle = Arc<dyn ConnectionHandle>;

struct Entry {
    handle: Handle,
    room_id: i32,
}

#[derive(Default)]
struct Shard {
    /// Session key → connection
    channels: HashMap<String, Entry>,
    /// Room ID → member session keys
    rooms: HashMap<i32, HashSet<String>>,
}

impl Shard {
    fn join(&mut self, key: &str, room_id: i32) {
        if room_id != NO_ROOM {
            self.rooms.entry(room_id).or_default().insert(key.to_string());
        }
    }

    fn leave(&mut self, key: &str, room_id: i32) {
        if let Some(members) = self.rooms.get_mut(&room_id) {
            members.remove(key);
            if members.is_empty() {
                self.rooms.remove(&room_id);
            }
        }
    }
}

/// Registry shard.
#[derive(Default)]
pub struct Bucket {
    shard: RwLock<Shard>,
}

impl Bucket {
    /// Create an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `key`, joining `room_id` unless it is
    /// [`NO_ROOM`].
    ///
    /// A connection already registered under `key` is replaced (and leaves
    /// its room); it is returned so the caller can close it.
    pub fn register(&self, key: &str, room_id: i32, handle: Handle) -> Option<Handle> {
        let mut shard = self.shard.write();

        let previous = shard.channels.insert(key.to_string(), Entry { handle, room_id });
        if let Some(old) = &previous {
            shard.leave(key, old.room_id);
        }
        shard.join(key, room_id);

        previous.map(|entry| entry.handle)
    }

    /// Remove whatever is registered under `key`.
    pub fn unregister(&self, key: &str) -> Option<Handle> {
        let mut shard = self.shard.write();
        let entry = shard.channels.remove(key)?;
        shard.leave(key, entry.room_id);
        Some(entry.handle)
    }

    /// Remove `key` only if it still maps to `handle`.
    ///
    /// A session that was replaced by a newer connection under the same key
    /// must not unregister its successor.
    pub fn unregister_if(&self, key: &str, handle: &Handle) -> bool {
        let mut shard = self.shard.write();

        let owned = shard.channels.get(key).is_some_and(|entry| Arc::ptr_eq(&entry.handle, handle));
        if !owned {
            return false;
        }

        if let Some(entry) = shard.channels.remove(key) {
            shard.leave(key, entry.room_id);
        }
        true
    }

    /// Connection registered under `key`.
    pub fn lookup(&self, key: &str) -> Option<Handle> {
        self.shard.read().channels.get(key).map(|entry| Arc::clone(&entry.handle))
    }

    /// Room `key` joined, if registered.
    pub fn room_of(&self, key: &str) -> Option<i32> {
        self.shard.read().channels.get(key).map(|entry| entry.room_id)
    }

    /// Keys of this bucket's members of `room_id`.
    pub fn room_members(&self, room_id: i32) -> HashSet<String> {
        self.shard.read().rooms.get(&room_id).cloned().unwrap_or_default()
    }

    /// Rooms with at least one member in this bucket.
    pub fn rooms(&self) -> Vec<i32> {
        self.shard.read().rooms.keys().copied().collect()
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.shard.read().channels.len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.shard.read().channels.is_empty()
    }

    /// Deliver `packet` to every connection in the bucket.
    ///
    /// Returns the number of connections that accepted it. Refusals are
    /// logged and skipped.
    pub fn broadcast(&self, packet: &Packet) -> usize {
        let handles: Vec<Handle> =
            self.shard.read().channels.values().map(|entry| Arc::clone(&entry.handle)).collect();
        deliver_all(&handles, packet)
    }

    /// Deliver `packet` to this bucket's members of `room_id`.
    ///
    /// Returns the number of members that accepted it.
    pub fn broadcast_room(&self, room_id: i32, packet: &Packet) -> usize {
        let handles: Vec<Handle> = {
            let shard = self.shard.read();
            let Some(members) = shard.rooms.get(&room_id) else {
                return 0;
            };
            members
                .iter()
                .filter_map(|key| shard.channels.get(key))
                .map(|entry| Arc::clone(&entry.handle))
                .collect()
        };
        deliver_all(&handles, packet)
    }
}

fn deliver_all(handles: &[Handle], packet: &Packet) -> usize {
    let mut delivered = 0;
    for handle in handles {
        match handle.deliver(packet.clone()) {
            Ok(()) => delivered += 1,
            Err(error) => tracing::debug!(%error, "broadcast delivery skipped"),
        }
    }
    delivered
}
