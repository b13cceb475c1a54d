//! Subscriber routes: which comet server holds each of a subscriber's
//! sessions.
//!
//! Every connect records a route under a fresh per-subscriber sequence
//! number; the sequence becomes part of the session key, so disconnects can
//! name the exact session they end.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use comet_proto::operation::NO_ROOM;
use comet_rpc::RpcFault;
use parking_lot::Mutex;
use thiserror::Error;

/// Where one session of a subscriber lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Per-subscriber session sequence
    pub seq: i32,
    /// Comet server holding the connection
    pub server_id: i32,
    /// Room the session joined
    pub room_id: i32,
}

/// Route store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Subscriber has used every sequence number
    #[error("sequence space exhausted for subscriber {0}")]
    SequenceExhausted(i64),

    /// Backing store could not be reached
    #[error("route store unavailable: {0}")]
    Unavailable(String),
}

impl From<RouteError> for RpcFault {
    fn from(err: RouteError) -> Self {
        Self::Downstream(err.to_string())
    }
}

/// Route persistence.
///
/// Must be Clone (shared between the RPC service and anything inspecting
/// routes), Send + Sync, and synchronous. Implementations share state via
/// `Arc`, so clones see the same routes.
pub trait RouteStore: Clone + Send + Sync + 'static {
    /// Record a new session of `uid` on `server_id` in `room_id`.
    ///
    /// Returns the session's sequence. Sequences are strictly increasing per
    /// subscriber and never reused, even after the route is cleared.
    fn record_route(&self, uid: i64, server_id: i32, room_id: i32) -> Result<i32, RouteError>;

    /// Remove session `seq` of `uid`.
    ///
    /// The route is only removed if it was recorded in `room_id`, or if
    /// `room_id` is [`NO_ROOM`]. Returns whether a route was removed.
    fn clear_route(&self, uid: i64, seq: i32, room_id: i32) -> Result<bool, RouteError>;

    /// Live routes of `uid`, in sequence order.
    fn routes(&self, uid: i64) -> Result<Vec<Route>, RouteError>;
}

#[derive(Default)]
struct Subscriber {
    next_seq: i32,
    routes: BTreeMap<i32, Route>,
}

/// In-process route store.
#[derive(Clone, Default)]
pub struct MemoryRouteStore {
    inner: Arc<Mutex<HashMap<i64, Subscriber>>>,
}

impl MemoryRouteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribers with at least one live route.
    pub fn online_count(&self) -> usize {
        self.inner.lock().values().filter(|s| !s.routes.is_empty()).count()
    }
}

impl RouteStore for MemoryRouteStore {
    fn record_route(&self, uid: i64, server_id: i32, room_id: i32) -> Result<i32, RouteError> {
        let mut inner = self.inner.lock();
        let subscriber = inner.entry(uid).or_default();

        let seq = subscriber.next_seq;
        subscriber.next_seq = seq.checked_add(1).ok_or(RouteError::SequenceExhausted(uid))?;
        subscriber.routes.insert(seq, Route { seq, server_id, room_id });

        Ok(seq)
    }

    fn clear_route(&self, uid: i64, seq: i32, room_id: i32) -> Result<bool, RouteError> {
        let mut inner = self.inner.lock();
        let Some(subscriber) = inner.get_mut(&uid) else {
            return Ok(false);
        };

        let matches = subscriber
            .routes
            .get(&seq)
            .is_some_and(|route| room_id == NO_ROOM || route.room_id == room_id);
        if matches {
            subscriber.routes.remove(&seq);
        }
        Ok(matches)
    }

    fn routes(&self, uid: i64) -> Result<Vec<Route>, RouteError> {
        let inner = self.inner.lock();
        Ok(inner.get(&uid).map(|s| s.routes.values().copied().collect()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_increase_per_subscriber() {
        let store = MemoryRouteStore::new();
        assert_eq!(store.record_route(1, 10, 7), Ok(0));
        assert_eq!(store.record_route(1, 11, 7), Ok(1));
        assert_eq!(store.record_route(2, 10, 7), Ok(0));
    }

    #[test]
    fn sequences_are_not_reused() {
        let store = MemoryRouteStore::new();
        let seq = store.record_route(1, 10, 7).unwrap();
        assert_eq!(store.clear_route(1, seq, 7), Ok(true));
        assert_eq!(store.record_route(1, 10, 7), Ok(seq + 1));
    }

    #[test]
    fn clear_requires_matching_room() {
        let store = MemoryRouteStore::new();
        let seq = store.record_route(1, 10, 7).unwrap();

        assert_eq!(store.clear_route(1, seq, 8), Ok(false));
        assert_eq!(store.routes(1).unwrap().len(), 1);
        assert_eq!(store.clear_route(1, seq, 7), Ok(true));
        assert_eq!(store.clear_route(1, seq, 7), Ok(false));
    }

    #[test]
    fn no_room_clears_any_room() {
        let store = MemoryRouteStore::new();
        let seq = store.record_route(1, 10, 7).unwrap();
        assert_eq!(store.clear_route(1, seq, NO_ROOM), Ok(true));
        assert_eq!(store.online_count(), 0);
    }

    #[test]
    fn unknown_subscriber_has_nothing() {
        let store = MemoryRouteStore::new();
        assert_eq!(store.clear_route(99, 0, 7), Ok(false));
        assert_eq!(store.routes(99), Ok(Vec::new()));
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryRouteStore::new();
        let clone = store.clone();
        store.record_route(1, 10, 7).unwrap();

        assert_eq!(clone.routes(1).unwrap(), vec![Route { seq: 0, server_id: 10, room_id: 7 }]);
    }
}
