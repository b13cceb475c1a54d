//! Control-plane service: lets the backend push into this server.

use std::sync::Arc;

use comet_proto::Packet;
use comet_rpc::{
    ControlReply, ControlRequest, ControlResponse, RpcFault, Service,
    control::{MPushMsgReply, RoomsReply},
};

use crate::server::{PushError, Server};

/// [`Service`] implementation over a [`Server`].
pub struct ControlRpc {
    server: Arc<Server>,
}

impl ControlRpc {
    /// Serve control requests against `server`.
    pub fn new(server: Arc<Server>) -> Self {
        Self { server }
    }

    /// Handle one request.
    ///
    /// # Panics
    ///
    /// `Broadcast` spawns its per-shard tasks, so it panics when called
    /// outside a Tokio runtime. [`Service::call`] always runs inside one.
    pub fn handle(&self, request: ControlRequest) -> ControlResponse {
        match request {
            ControlRequest::Ping => Ok(ControlReply::Pong),

            ControlRequest::PushMsg(arg) => {
                let arg = arg.ok_or_else(|| missing("PushMsg"))?;
                self.server.push(&arg.key, arg.frame.into()).map_err(delivery_fault)?;
                Ok(ControlReply::Done)
            },

            ControlRequest::MPushMsg(arg) => {
                let arg = arg.ok_or_else(|| missing("MPushMsg"))?;
                let packet = Packet::from(arg.frame);
                let index = self.server.push_many(&arg.keys, &packet).map_err(delivery_fault)?;
                Ok(ControlReply::Pushed(MPushMsgReply { index }))
            },

            ControlRequest::MPushMsgs(arg) => {
                let arg = arg.ok_or_else(|| missing("MPushMsgs"))?;
                let targets =
                    arg.targets.iter().map(|t| (t.key.as_str(), Packet::from(t.frame.clone())));
                let index = self.server.push_many_distinct(targets).map_err(delivery_fault)?;
                Ok(ControlReply::Pushed(MPushMsgReply { index }))
            },

            ControlRequest::Broadcast(arg) => {
                let arg = arg.ok_or_else(|| missing("Broadcast"))?;
                self.server.broadcast(arg.frame.into());
                Ok(ControlReply::Done)
            },

            ControlRequest::BroadcastRoom(arg) => {
                let arg = arg.ok_or_else(|| missing("BroadcastRoom"))?;
                self.server.broadcast_room(arg.room_id, &arg.frame.into());
                Ok(ControlReply::Done)
            },

            ControlRequest::Rooms => {
                Ok(ControlReply::Rooms(RoomsReply { room_ids: self.server.rooms() }))
            },
        }
    }
}

impl Service for ControlRpc {
    type Request = ControlRequest;
    type Response = ControlResponse;

    async fn call(&self, request: ControlRequest) -> ControlResponse {
        let response = self.handle(request);
        if let Err(fault) = &response {
            tracing::debug!(%fault, "control request failed");
        }
        response
    }
}

fn missing(operation: &str) -> RpcFault {
    RpcFault::InvalidArgument(format!("{operation} argument is required"))
}

fn delivery_fault(err: PushError) -> RpcFault {
    RpcFault::Delivery { index: err.last_matched, reason: err.to_string() }
}
