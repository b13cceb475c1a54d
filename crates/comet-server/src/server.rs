//! Push dispatch over the sharded registry.
//!
//! [`Server`] owns a fixed array of [`Bucket`]s and routes every key to one
//! of them by hash. It is built once at startup and shared by reference
//! (behind an `Arc`) with the control RPC and every client session.

use std::{collections::BTreeSet, sync::Arc};

use ahash::RandomState;
use comet_proto::Packet;
use thiserror::Error;

use crate::{
    bucket::{Bucket, Handle},
    channel::DeliveryError,
    stats::StatsSink,
};

/// Fixed seeds so a key maps to the same bucket for every run of the binary.
const SHARD_SEEDS: [u64; 4] =
    [0x243f_6a88_85a3_08d3, 0x1319_8a2e_0370_7344, 0xa409_3822_299f_31d0, 0x082e_fa98_ec4e_6c89];

/// A connection refused a packet during a push.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("delivery to {key} failed: {source} (last matched index {last_matched})")]
pub struct PushError {
    /// Key whose connection refused the packet
    pub key: String,
    /// Index of the last target that accepted the packet before the failure,
    /// -1 if none did
    pub last_matched: i32,
    /// Refusal reason
    #[source]
    pub source: DeliveryError,
}

/// The comet tier's connection registry and push dispatcher.
pub struct Server {
    buckets: Box<[Arc<Bucket>]>,
    hasher: RandomState,
    stats: Arc<dyn StatsSink>,
}

impl Server {
    /// Create a server with `bucket_count` shards (at least one).
    pub fn new(bucket_count: usize, stats: Arc<dyn StatsSink>) -> Self {
        let buckets = (0..bucket_count.max(1)).map(|_| Arc::new(Bucket::new())).collect();
        let [k0, k1, k2, k3] = SHARD_SEEDS;
        Self { buckets, hasher: RandomState::with_seeds(k0, k1, k2, k3), stats }
    }

    /// All shards, in index order.
    pub fn buckets(&self) -> &[Arc<Bucket>] {
        &self.buckets
    }

    /// Shard index owning `key`.
    pub fn bucket_index(&self, key: &str) -> usize {
        (self.hasher.hash_one(key) % self.buckets.len() as u64) as usize
    }

    /// Shard owning `key`.
    pub fn bucket(&self, key: &str) -> &Arc<Bucket> {
        &self.buckets[self.bucket_index(key)]
    }

    /// Register a connection in the shard owning `key`.
    pub fn register(&self, key: &str, room_id: i32, handle: Handle) -> Option<Handle> {
        self.bucket(key).register(key, room_id, handle)
    }

    /// Unregister `key` if it still maps to `handle`.
    pub fn unregister_if(&self, key: &str, handle: &Handle) -> bool {
        self.bucket(key).unregister_if(key, handle)
    }

    /// Total registered connections across all shards.
    pub fn connection_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }

    /// Deliver `packet` to the connection under `key`.
    ///
    /// A key with no live connection is not an error.
    pub fn push(&self, key: &str, packet: Packet) -> Result<(), PushError> {
        let Some(handle) = self.bucket(key).lookup(key) else {
            tracing::trace!(key, "push target not connected");
            return Ok(());
        };

        handle
            .deliver(packet)
            .map_err(|source| PushError { key: key.to_string(), last_matched: -1, source })?;
        self.stats.incr_push();
        Ok(())
    }

    /// Deliver `packet` to each key in order.
    ///
    /// Returns the index of the last key that matched a live connection, or
    /// -1 if none did. The first refusal stops the iteration.
    pub fn push_many<K: AsRef<str>>(&self, keys: &[K], packet: &Packet) -> Result<i32, PushError> {
        self.push_each(keys.iter().map(|key| (key.as_ref(), packet.clone())))
    }

    /// Deliver a distinct packet to each key in order, with the same result
    /// semantics as [`Server::push_many`].
    pub fn push_many_distinct<'a>(
        &self,
        targets: impl IntoIterator<Item = (&'a str, Packet)>,
    ) -> Result<i32, PushError> {
        self.push_each(targets)
    }

    fn push_each<'a>(
        &self,
        targets: impl IntoIterator<Item = (&'a str, Packet)>,
    ) -> Result<i32, PushError> {
        let mut last_matched = -1;

        for (index, (key, packet)) in targets.into_iter().enumerate() {
            let Some(handle) = self.bucket(key).lookup(key) else {
                continue;
            };

            if let Err(source) = handle.deliver(packet) {
                tracing::debug!(key, index, %source, "multi-target push aborted");
                return Err(PushError { key: key.to_string(), last_matched, source });
            }

            last_matched = index as i32;
            self.stats.incr_push();
        }

        Ok(last_matched)
    }

    /// Deliver `packet` to every connection.
    ///
    /// One task is spawned per shard; this returns as soon as they are
    /// spawned, without waiting for delivery. Must be called from within a
    /// Tokio runtime.
    pub fn broadcast(&self, packet: Packet) {
        for bucket in self.buckets.iter() {
            let bucket = Arc::clone(bucket);
            let packet = packet.clone();
            tokio::spawn(async move {
                bucket.broadcast(&packet);
            });
        }
        self.stats.incr_broadcast();
    }

    /// Deliver `packet` to every member of `room_id`, shard by shard.
    ///
    /// Returns the number of members that accepted it.
    pub fn broadcast_room(&self, room_id: i32, packet: &Packet) -> usize {
        let delivered: usize =
            self.buckets.iter().map(|bucket| bucket.broadcast_room(room_id, packet)).sum();
        self.stats.incr_room_broadcast();
        tracing::debug!(room_id, delivered, "room broadcast");
        delivered
    }

    /// Rooms with at least one member on this server.
    pub fn rooms(&self) -> BTreeSet<i32> {
        self.buckets.iter().flat_map(|bucket| bucket.rooms()).collect()
    }
}
