//! Control plane: served by the comet tier, called by the backend to push.
//!
//! Every argument structure is optional on the wire. An absent argument is
//! rejected with [`RpcFault::InvalidArgument`] before any state changes.

use std::collections::BTreeSet;

use comet_proto::Frame;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    error::{RpcError, RpcFault},
    transport::Client,
};

/// Push one frame to one session key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMsgArg {
    /// Target session key
    pub key: String,
    /// Frame to deliver
    pub frame: Frame,
}

/// Push one frame to many session keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MPushMsgArg {
    /// Target session keys, in delivery order
    pub keys: Vec<String>,
    /// Frame to deliver to each
    pub frame: Frame,
}

/// Push a distinct frame to each of many session keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MPushMsgsArg {
    /// Targets, in delivery order
    pub targets: Vec<PushMsgArg>,
}

/// Push one frame to every connection on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastArg {
    /// Frame to deliver
    pub frame: Frame,
}

/// Push one frame to every member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRoomArg {
    /// Target room
    pub room_id: i32,
    /// Frame to deliver
    pub frame: Frame,
}

/// Result of a multi-target push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MPushMsgReply {
    /// Index of the last target that matched a live connection, -1 if none
    pub index: i32,
}

/// Rooms with at least one member on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomsReply {
    /// Room ids
    pub room_ids: BTreeSet<i32>,
}

/// Control-plane request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlRequest {
    /// Liveness check
    Ping,
    /// Single-key push
    PushMsg(Option<PushMsgArg>),
    /// Multi-key push with a shared frame
    MPushMsg(Option<MPushMsgArg>),
    /// Multi-key push with per-key frames
    MPushMsgs(Option<MPushMsgsArg>),
    /// Server-wide broadcast
    Broadcast(Option<BroadcastArg>),
    /// Room broadcast
    BroadcastRoom(Option<BroadcastRoomArg>),
    /// Room listing
    Rooms,
}

/// Control-plane success reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlReply {
    /// Reply to `Ping`
    Pong,
    /// Reply to `PushMsg`, `Broadcast` and `BroadcastRoom`
    Done,
    /// Reply to `MPushMsg` and `MPushMsgs`
    Pushed(MPushMsgReply),
    /// Reply to `Rooms`
    Rooms(RoomsReply),
}

/// Control-plane response as carried on the wire.
pub type ControlResponse = Result<ControlReply, RpcFault>;

/// Client for the control plane over TCP.
pub type ControlClient = Client<ControlRequest, ControlResponse>;

impl<T> Client<ControlRequest, ControlResponse, T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Liveness check.
    pub async fn ping(&self) -> Result<(), RpcError> {
        match self.call(&ControlRequest::Ping).await?? {
            ControlReply::Pong => Ok(()),
            _ => Err(RpcError::UnexpectedReply),
        }
    }

    /// Push `frame` to `key`.
    pub async fn push_msg(&self, key: impl Into<String>, frame: Frame) -> Result<(), RpcError> {
        let arg = PushMsgArg { key: key.into(), frame };
        match self.call(&ControlRequest::PushMsg(Some(arg))).await?? {
            ControlReply::Done => Ok(()),
            _ => Err(RpcError::UnexpectedReply),
        }
    }

    /// Push `frame` to every key; returns the last matched index.
    pub async fn mpush_msg(&self, keys: Vec<String>, frame: Frame) -> Result<i32, RpcError> {
        let arg = MPushMsgArg { keys, frame };
        match self.call(&ControlRequest::MPushMsg(Some(arg))).await?? {
            ControlReply::Pushed(reply) => Ok(reply.index),
            _ => Err(RpcError::UnexpectedReply),
        }
    }

    /// Push a distinct frame per key; returns the last matched index.
    pub async fn mpush_msgs(&self, targets: Vec<PushMsgArg>) -> Result<i32, RpcError> {
        let arg = MPushMsgsArg { targets };
        match self.call(&ControlRequest::MPushMsgs(Some(arg))).await?? {
            ControlReply::Pushed(reply) => Ok(reply.index),
            _ => Err(RpcError::UnexpectedReply),
        }
    }

    /// Broadcast `frame` to every connection.
    pub async fn broadcast(&self, frame: Frame) -> Result<(), RpcError> {
        match self.call(&ControlRequest::Broadcast(Some(BroadcastArg { frame }))).await?? {
            ControlReply::Done => Ok(()),
            _ => Err(RpcError::UnexpectedReply),
        }
    }

    /// Broadcast `frame` to the members of `room_id`.
    pub async fn broadcast_room(&self, room_id: i32, frame: Frame) -> Result<(), RpcError> {
        let arg = BroadcastRoomArg { room_id, frame };
        match self.call(&ControlRequest::BroadcastRoom(Some(arg))).await?? {
            ControlReply::Done => Ok(()),
            _ => Err(RpcError::UnexpectedReply),
        }
    }

    /// Rooms with at least one member on the server.
    pub async fn rooms(&self) -> Result<BTreeSet<i32>, RpcError> {
        match self.call(&ControlRequest::Rooms).await?? {
            ControlReply::Rooms(reply) => Ok(reply.room_ids),
            _ => Err(RpcError::UnexpectedReply),
        }
    }
}
