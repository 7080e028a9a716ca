use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};
use rosc::{OscMessage, OscType};
use tracing::debug;

use crate::constants::XREMOTE_ADDRESS;
use crate::error::{OscError, Result};
use crate::osc::registry::{Handler, ListenerId};
use crate::osc::socket::OscSocket;

/// The request/response surface parameter accessors are built on.
pub trait Remote: Send + Sync {
    /// Sends an argument-less message to `address` and returns the first reply.
    fn query(&self, address: &str) -> Result<OscMessage>;

    /// Sends `args` to `address` without waiting for a reply.
    fn set(&self, address: &str, args: Vec<OscType>) -> Result<()>;

    fn subscribe(&self, address: &str, handler: Handler) -> ListenerId;

    fn unsubscribe(&self, address: &str, id: Option<ListenerId>);
}

/// Talks to a single mixer at `target`.
pub struct OscClient {
    socket: Arc<OscSocket>,
    target: SocketAddr,
    query_timeout: Option<Duration>,
}

impl OscClient {
    pub fn new(socket: Arc<OscSocket>, target: SocketAddr) -> Self {
        OscClient {
            socket,
            target,
            query_timeout: None,
        }
    }

    /// Binds an ephemeral local port and targets `target`.
    pub fn connect<A: ToSocketAddrs>(target: A) -> Result<Self> {
        let target = target
            .to_socket_addrs()
            .map_err(OscError::Socket)?
            .next()
            .ok_or_else(|| {
                OscError::Socket(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "target resolved to no address",
                ))
            })?;
        let socket = OscSocket::bind(("0.0.0.0", 0))?;
        Ok(OscClient::new(Arc::new(socket), target))
    }

    /// Gives up on queries after `timeout`. Without this a lost reply blocks forever.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn socket(&self) -> &Arc<OscSocket> {
        &self.socket
    }

    pub fn query(&self, address: &str) -> Result<OscMessage> {
        let (tx, rx) = bounded(1);
        let id = self.socket.once(address, move |message, _| {
            let _ = tx.try_send(message.clone());
            Ok(())
        });

        let probe = OscMessage {
            addr: address.to_string(),
            args: vec![],
        };
        if let Err(err) = self.socket.send(&probe, self.target) {
            self.socket.off(address, Some(id));
            return Err(err);
        }
        debug!("query {address} -> {}", self.target);

        match self.query_timeout {
            None => rx.recv().map_err(|_| OscError::Closed),
            Some(timeout) => match rx.recv_timeout(timeout) {
                Ok(reply) => Ok(reply),
                Err(RecvTimeoutError::Timeout) => {
                    // Nothing to remove means the dispatcher already took the
                    // listener, so its reply is on the way.
                    if self.socket.remove_listener(address, Some(id)) == 0 {
                        return rx.recv().map_err(|_| OscError::Closed);
                    }
                    Err(OscError::Timeout {
                        address: address.to_string(),
                        timeout,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => Err(OscError::Closed),
            },
        }
    }

    pub fn set(&self, address: &str, args: Vec<OscType>) -> Result<()> {
        let message = OscMessage {
            addr: address.to_string(),
            args,
        };
        self.socket.send(&message, self.target)?;
        debug!("set {address} {:?} -> {}", message.args, self.target);
        Ok(())
    }

    pub fn on<F>(&self, address: &str, handler: F) -> ListenerId
    where
        F: Fn(&OscMessage, SocketAddr) -> std::result::Result<(), OscError> + Send + Sync + 'static,
    {
        self.socket.on(address, handler)
    }

    pub fn off(&self, address: &str, id: Option<ListenerId>) {
        self.socket.off(address, id);
    }

    /// Asks the mixer to push parameter changes to this client for the next ~10 s.
    pub fn xremote(&self) -> Result<()> {
        self.set(XREMOTE_ADDRESS, vec![])
    }

    pub fn close(&self) -> Result<()> {
        self.socket.close()
    }
}

impl Remote for OscClient {
    fn query(&self, address: &str) -> Result<OscMessage> {
        OscClient::query(self, address)
    }

    fn set(&self, address: &str, args: Vec<OscType>) -> Result<()> {
        OscClient::set(self, address, args)
    }

    fn subscribe(&self, address: &str, handler: Handler) -> ListenerId {
        self.socket.add_listener(address, handler, false)
    }

    fn unsubscribe(&self, address: &str, id: Option<ListenerId>) {
        self.socket.off(address, id);
    }
}
