//! Token authentication.
//!
//! An [`Authenticator`] turns the opaque token a client sends into the
//! subscriber and room its session belongs to. Authentication never fails:
//! tokens that identify nobody get a fresh anonymous subscriber id.
//!
//! Anonymous ids carry [`ANONYMOUS_ID_BIT`]; authenticated ids must lie below
//! it. The two namespaces cannot collide.

use std::sync::atomic::{AtomicI64, Ordering};

use comet_proto::operation::NO_ROOM;
use serde::Deserialize;

/// Set in every anonymous subscriber id and in no authenticated one.
pub const ANONYMOUS_ID_BIT: i64 = 1 << 62;

/// Who a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Subscriber id, always positive
    pub user_id: i64,
    /// Room to join, or [`NO_ROOM`]
    pub room_id: i32,
}

/// Policy mapping tokens to identities.
pub trait Authenticator: Send + Sync + 'static {
    /// Resolve `token`. Must not fail.
    fn authenticate(&self, token: &str) -> Identity;
}

/// Allocator for anonymous subscriber ids.
///
/// Ordinals start at 1 and increase by one per allocation.
#[derive(Debug, Default)]
pub struct AnonymousIds {
    last: AtomicI64,
}

impl AnonymousIds {
    /// Allocator whose first id has ordinal 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next anonymous subscriber id.
    pub fn allocate(&self) -> i64 {
        let ordinal = self.last.fetch_add(1, Ordering::Relaxed) + 1;
        ANONYMOUS_ID_BIT | ordinal
    }

    /// Whether `user_id` came from an allocator.
    pub fn is_anonymous(user_id: i64) -> bool {
        user_id > 0 && user_id & ANONYMOUS_ID_BIT != 0
    }

    /// Allocation ordinal of an anonymous id.
    pub fn ordinal(user_id: i64) -> Option<i64> {
        Self::is_anonymous(user_id).then_some(user_id & !ANONYMOUS_ID_BIT)
    }
}

/// Token claims as legacy clients send them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    #[serde(default)]
    user_id: i64,
    #[serde(default = "no_room")]
    room_id: i32,
}

fn no_room() -> i32 {
    NO_ROOM
}

/// Authenticates `{"userId": <i64>, "roomId": <i32>}` JSON tokens.
///
/// An unparsable token joins no room. A missing, non-positive or
/// out-of-range user id is replaced by an anonymous one.
///
/// A token without `roomId` also joins no room ([`NO_ROOM`]). Legacy
/// servers decoded the missing field as room 0, which put every such client
/// in one shared room; that is deliberately not reproduced.
#[derive(Debug, Default)]
pub struct JsonTokenAuthenticator {
    anonymous: AnonymousIds,
}

impl JsonTokenAuthenticator {
    /// Authenticator with a fresh anonymous id allocator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Authenticator for JsonTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Identity {
        let claims = match serde_json::from_str::<Claims>(token) {
            Ok(claims) => claims,
            Err(error) => {
                tracing::debug!(%error, "unparsable token, treating as anonymous");
                Claims { user_id: 0, room_id: NO_ROOM }
            },
        };

        let user_id = if (1..ANONYMOUS_ID_BIT).contains(&claims.user_id) {
            claims.user_id
        } else {
            self.anonymous.allocate()
        };

        Identity { user_id, room_id: claims.room_id }
    }
}
