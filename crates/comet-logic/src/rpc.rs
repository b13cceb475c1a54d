//! Session-plane service: comet servers call this on connect and disconnect.

use comet_rpc::{
    RpcFault, Service, SessionReply, SessionRequest, SessionResponse,
    session::{ConnArg, ConnReply, DisconnArg, DisconnReply},
};

use crate::{auth::Authenticator, config::LogicConfig, key, route::RouteStore};

/// [`Service`] implementation over an authenticator and a route store.
pub struct SessionRpc<A, R> {
    auth: A,
    routes: R,
    heartbeat_secs: u64,
}

impl<A: Authenticator, R: RouteStore> SessionRpc<A, R> {
    /// Serve session requests.
    pub fn new(auth: A, routes: R, config: &LogicConfig) -> Self {
        Self { auth, routes, heartbeat_secs: config.heartbeat.as_secs() }
    }

    /// Route store backing this service.
    pub fn routes(&self) -> &R {
        &self.routes
    }

    /// Handle one request.
    pub fn handle(&self, request: SessionRequest) -> SessionResponse {
        match request {
            SessionRequest::Ping => Ok(SessionReply::Pong),
            SessionRequest::Connect(arg) => {
                let arg = arg.ok_or_else(|| missing("Connect"))?;
                self.connect(arg).map(SessionReply::Connected)
            },
            SessionRequest::Disconnect(arg) => {
                let arg = arg.ok_or_else(|| missing("Disconnect"))?;
                self.disconnect(&arg).map(SessionReply::Disconnected)
            },
        }
    }

    fn connect(&self, arg: ConnArg) -> Result<ConnReply, RpcFault> {
        let identity = self.auth.authenticate(&arg.token);
        let seq = self.routes.record_route(identity.user_id, arg.server_id, identity.room_id)?;
        let key = key::encode(identity.user_id, seq);

        tracing::debug!(%key, room_id = identity.room_id, server_id = arg.server_id, "connect");

        Ok(ConnReply { key, room_id: identity.room_id, heartbeat_secs: self.heartbeat_secs })
    }

    fn disconnect(&self, arg: &DisconnArg) -> Result<DisconnReply, RpcFault> {
        let (uid, seq) = key::decode(&arg.key)?;
        let has = self.routes.clear_route(uid, seq, arg.room_id)?;

        tracing::debug!(key = %arg.key, room_id = arg.room_id, has, "disconnect");

        Ok(DisconnReply { has })
    }
}

impl<A: Authenticator, R: RouteStore> Service for SessionRpc<A, R> {
    type Request = SessionRequest;
    type Response = SessionResponse;

    async fn call(&self, request: SessionRequest) -> SessionResponse {
        let response = self.handle(request);
        if let Err(fault) = &response {
            tracing::warn!(%fault, "session request failed");
        }
        response
    }
}

fn missing(operation: &str) -> RpcFault {
    RpcFault::InvalidArgument(format!("{operation} argument is required"))
}
