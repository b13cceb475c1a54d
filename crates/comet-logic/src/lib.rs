//! Logic tier of the comet push system.
//!
//! Comet servers hand every new client's token to this tier. It decides who
//! the client is ([`Authenticator`]), records where the session lives
//! ([`RouteStore`]) and issues the opaque session key ([`key`]) the comet
//! server registers the connection under. Disconnects come back with that
//! key and clear the route.
//!
//! Session lifecycle: `Unauthenticated → Connected → Disconnected`. A
//! session exists from a successful `Connect` until the `Disconnect` that
//! names its key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
mod config;
pub mod key;
pub mod route;
mod rpc;

pub use auth::{ANONYMOUS_ID_BIT, AnonymousIds, Authenticator, Identity, JsonTokenAuthenticator};
pub use config::LogicConfig;
pub use key::MalformedKey;
pub use route::{MemoryRouteStore, Route, RouteError, RouteStore};
pub use rpc::SessionRpc;
