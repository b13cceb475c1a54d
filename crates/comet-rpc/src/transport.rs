//! Request/response transport over any byte stream.
//!
//! One request is in flight per connection: the server answers requests in
//! the order they arrive and the client serializes calls behind a lock.
//! Callers that need concurrency open more connections. A client connection
//! that breaks is dropped and redialed on the following call.

use std::{future::Future, io, marker::PhantomData, net::SocketAddr, sync::Arc};

use futures::{SinkExt, StreamExt, future::BoxFuture};
use serde::{Serialize, de::DeserializeOwned};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream, ToSocketAddrs, lookup_host},
    sync::Mutex,
};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::{codec, error::RpcError};

/// A request handler exposed over the transport.
pub trait Service: Send + Sync + 'static {
    /// Request message
    type Request: DeserializeOwned + Send;
    /// Response message, including any application-level failure
    type Response: Serialize + Send;

    /// Handle one request.
    fn call(&self, request: Self::Request) -> impl Future<Output = Self::Response> + Send;
}

/// Accept connections forever, serving each on its own task.
///
/// Accept failures are logged and the loop continues.
pub async fn serve<S: Service>(listener: TcpListener, service: Arc<S>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                tracing::warn!(%error, "rpc accept failed");
                continue;
            },
        };

        if let Err(error) = stream.set_nodelay(true) {
            tracing::debug!(%peer, %error, "failed to set TCP_NODELAY");
        }

        let service = Arc::clone(&service);
        tokio::spawn(async move {
            match serve_connection(stream, service).await {
                Ok(()) => tracing::debug!(%peer, "rpc peer disconnected"),
                Err(error) => tracing::warn!(%peer, %error, "rpc connection failed"),
            }
        });
    }
}

/// Serve requests from one connection until the peer closes it.
///
/// A request that cannot be decoded ends the connection: the peer is not
/// speaking this protocol and there is no request to attach a reply to.
pub async fn serve_connection<S, T>(io: T, service: Arc<S>) -> Result<(), RpcError>
where
    S: Service,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(io, codec::framing());

    while let Some(message) = framed.next().await {
        let message = message?;
        let request: S::Request = codec::decode(&message)?;
        let response = service.call(request).await;
        framed.send(codec::encode(&response)?).await?;
    }

    Ok(())
}

/// Opens a fresh stream for a client whose connection was discarded.
type Redial<T> = Box<dyn Fn() -> BoxFuture<'static, io::Result<T>> + Send + Sync>;

/// Typed client for one RPC connection.
///
/// The connection is taken out of the client for the duration of each call
/// and put back only once the reply has been read. A call that fails, or
/// whose future is dropped mid-flight, leaves the client without a
/// connection, so no later caller can read a reply meant for someone else.
/// Clients built with [`Client::dial`] redial on the next call; clients
/// wrapping a stream with [`Client::new`] report [`RpcError::Closed`].
pub struct Client<Req, Resp, T = TcpStream> {
    framed: Mutex<Option<Framed<T, LengthDelimitedCodec>>>,
    redial: Option<Redial<T>>,
    _messages: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> Client<Req, Resp, TcpStream> {
    /// Open a TCP connection to `addr`, remembering it for reconnects.
    pub async fn dial(addr: impl ToSocketAddrs) -> Result<Self, RpcError> {
        let addrs: Arc<[SocketAddr]> = lookup_host(addr).await?.collect();
        let redial: Redial<TcpStream> = Box::new(move || -> BoxFuture<'static, _> {
            let addrs = Arc::clone(&addrs);
            Box::pin(async move { connect_tcp(&addrs).await })
        });

        let stream = redial().await?;
        Ok(Self {
            framed: Mutex::new(Some(Framed::new(stream, codec::framing()))),
            redial: Some(redial),
            _messages: PhantomData,
        })
    }
}

async fn connect_tcp(addrs: &[SocketAddr]) -> io::Result<TcpStream> {
    let stream = TcpStream::connect(addrs).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

impl<Req, Resp, T> Client<Req, Resp, T> {
    /// Wrap an already-connected stream. The client cannot reconnect.
    pub fn new(io: T) -> Self {
        Self {
            framed: Mutex::new(Some(Framed::new(io, codec::framing()))),
            redial: None,
            _messages: PhantomData,
        }
    }
}

impl<Req, Resp, T> Client<Req, Resp, T>
where
    Req: Serialize,
    Resp: DeserializeOwned,
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Send `request` and wait for its response.
    ///
    /// A transport or decode failure discards the connection; the next call
    /// opens a new one when the client knows how to.
    pub async fn call(&self, request: &Req) -> Result<Resp, RpcError> {
        let payload = codec::encode(request)?;

        let mut slot = self.framed.lock().await;
        let mut framed = match slot.take() {
            Some(framed) => framed,
            None => self.reconnect().await?,
        };

        framed.send(payload).await?;
        let message = framed.next().await.ok_or(RpcError::Closed)??;
        let response = codec::decode(&message)?;

        *slot = Some(framed);
        Ok(response)
    }

    async fn reconnect(&self) -> Result<Framed<T, LengthDelimitedCodec>, RpcError> {
        let redial = self.redial.as_ref().ok_or(RpcError::Closed)?;
        let io = redial().await?;
        tracing::debug!("rpc connection re-established");
        Ok(Framed::new(io, codec::framing()))
    }
}
