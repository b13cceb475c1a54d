//! Connection handles: the registry's only view of a live connection.

use comet_proto::Packet;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Why a connection refused a packet.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// Outbound queue is at capacity; the peer is not draining fast enough
    #[error("outbound queue full")]
    Full,

    /// Writer side of the connection has gone away
    #[error("connection closed")]
    Closed,
}

/// Something a packet can be delivered to.
///
/// `deliver` must not block: it is called with the owning bucket's read lock
/// released but from inside push fan-out loops.
pub trait ConnectionHandle: Send + Sync + 'static {
    /// Queue `packet` for the connection.
    fn deliver(&self, packet: Packet) -> Result<(), DeliveryError>;
}

/// Bounded queue feeding one connection's writer task.
///
/// The receiver half has a single consumer, so packets delivered through one
/// channel reach the peer in the order they were accepted.
#[derive(Debug, Clone)]
pub struct Channel {
    sender: mpsc::Sender<Packet>,
}

impl Channel {
    /// Create a channel holding at most `capacity` undelivered packets.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Packet>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queue `packet`, waiting for room instead of refusing it.
    ///
    /// Used by the session's own replies, which must not be dropped.
    pub async fn send(&self, packet: Packet) -> Result<(), DeliveryError> {
        self.sender.send(packet).await.map_err(|_| DeliveryError::Closed)
    }
}

impl ConnectionHandle for Channel {
    fn deliver(&self, packet: Packet) -> Result<(), DeliveryError> {
        self.sender.try_send(packet).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use comet_proto::Frame;

    use super::*;

    #[test]
    fn delivers_in_order() {
        let (channel, mut receiver) = Channel::new(4);
        channel.deliver(Frame::new(4, "a").into()).unwrap();
        channel.deliver(Frame::new(4, "b").into()).unwrap();

        assert_eq!(receiver.try_recv().unwrap(), Packet::Framed(Frame::new(4, "a")));
        assert_eq!(receiver.try_recv().unwrap(), Packet::Framed(Frame::new(4, "b")));
    }

    #[test]
    fn full_queue_is_reported() {
        let (channel, _receiver) = Channel::new(1);
        channel.deliver(Frame::new(4, "a").into()).unwrap();
        assert_eq!(channel.deliver(Frame::new(4, "b").into()), Err(DeliveryError::Full));
    }

    #[test]
    fn dropped_receiver_is_closed() {
        let (channel, receiver) = Channel::new(1);
        drop(receiver);
        assert_eq!(channel.deliver(Frame::new(4, "a").into()), Err(DeliveryError::Closed));
    }
}
