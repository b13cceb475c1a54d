//! Server side of one client connection.
//!
//! A session authenticates with its first frame, registers a [`Channel`] in
//! the registry, then answers heartbeats until the peer goes away or stays
//! silent for the heartbeat interval the logic tier granted.
//!
//! Every byte written to the peer goes through the channel's single writer
//! task, so replies and pushes are never interleaved mid-frame.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use comet_proto::{
    Frame, Packet, ProtocolError,
    operation::{OP_AUTH, OP_AUTH_REPLY, OP_HEARTBEAT, OP_HEARTBEAT_REPLY, reply_of},
    tcp::{read_frame, write_packet},
};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, WriteHalf},
    sync::mpsc,
    time::timeout,
};

use crate::{
    bucket::Handle,
    channel::{Channel, DeliveryError},
    config::SessionConfig,
    error::ServerError,
    logic_client::LogicClient,
    server::Server,
};

/// Time the writer gets to flush queued packets once the session ends.
const WRITER_DRAIN: Duration = Duration::from_secs(1);

/// Serve one client connection to completion.
///
/// Returns `Ok(())` when the peer disconnects or idles out after a
/// successful handshake.
pub async fn run_session<S, L>(
    stream: S,
    server: Arc<Server>,
    logic: Arc<L>,
    config: SessionConfig,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    L: LogicClient,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    let auth = match timeout(config.handshake_timeout, read_frame(&mut reader)).await {
        Ok(frame) => frame?,
        Err(_) => return Err(ServerError::Handshake("no auth frame before timeout".to_string())),
    };
    if auth.operation != OP_AUTH {
        return Err(ServerError::Handshake(format!(
            "expected auth operation, got {}",
            auth.operation
        )));
    }

    let token = String::from_utf8_lossy(&auth.body);
    let conn = logic.connect(&token, config.server_id).await?;
    let heartbeat = Duration::from_secs(conn.heartbeat_secs.max(1));

    let (channel, receiver) = Channel::new(config.channel_capacity);
    let handle: Handle = Arc::new(channel.clone());
    let mut writer = tokio::spawn(write_loop(writer, receiver));

    // The auth reply is queued before the connection becomes reachable, so
    // no push can overtake it.
    let result = async {
        send(&channel, auth.reply(OP_AUTH_REPLY, Bytes::new())).await?;

        if server.register(&conn.key, conn.room_id, Arc::clone(&handle)).is_some() {
            tracing::debug!(key = %conn.key, "replaced existing connection");
        }
        tracing::debug!(key = %conn.key, room_id = conn.room_id, "session established");

        serve_frames(&mut reader, &channel, heartbeat, &conn.key).await
    }
    .await;

    server.unregister_if(&conn.key, &handle);
    drop(handle);
    drop(channel);
    if timeout(WRITER_DRAIN, &mut writer).await.is_err() {
        writer.abort();
    }

    match logic.disconnect(&conn.key, conn.room_id).await {
        Ok(had_route) => tracing::debug!(key = %conn.key, had_route, "session closed"),
        Err(error) => tracing::warn!(key = %conn.key, %error, "logic disconnect failed"),
    }

    result
}

async fn serve_frames<R>(
    reader: &mut R,
    channel: &Channel,
    heartbeat: Duration,
    key: &str,
) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = match timeout(heartbeat, read_frame(reader)).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(ProtocolError::ConnectionClosed)) => return Ok(()),
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => {
                tracing::debug!(key, "heartbeat timeout");
                return Ok(());
            },
        };

        let reply = match frame.operation {
            OP_HEARTBEAT => frame.reply(OP_HEARTBEAT_REPLY, Bytes::new()),
            operation => frame.reply(reply_of(operation), frame.body.clone()),
        };
        send(channel, reply).await?;
    }
}

/// Queue a reply behind any pending pushes, waiting for room if needed.
async fn send(channel: &Channel, frame: Frame) -> Result<(), ServerError> {
    channel
        .send(Packet::Framed(frame))
        .await
        .map_err(|err: DeliveryError| ServerError::Transport(err.to_string()))
}

async fn write_loop<W>(mut writer: WriteHalf<W>, mut receiver: mpsc::Receiver<Packet>)
where
    W: AsyncWrite,
{
    while let Some(packet) = receiver.recv().await {
        if let Err(error) = write_packet(&mut writer, &packet).await {
            tracing::debug!(%error, "client write failed");
            return;
        }
        // Coalesce: only flush once the queue is momentarily empty.
        if receiver.is_empty() && writer.flush().await.is_err() {
            return;
        }
    }
    let _ = writer.shutdown().await;
}
