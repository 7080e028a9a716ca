use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use rosc::{OscMessage, OscPacket};
use tracing::{debug, error, trace, warn};

use crate::constants::RECEIVE_POLL_INTERVAL;
use crate::error::{OscError, Result};
use crate::osc::codec::{RoscCodec, WireCodec};
use crate::osc::registry::{Handler, ListenerId, ListenerRegistry};

/// One UDP socket plus the listeners subscribed to inbound addresses.
///
/// A background thread receives datagrams, decodes them and fans each message out
/// to every listener registered for its exact address.
pub struct OscSocket {
    socket: Arc<UdpSocket>,
    registry: Arc<Mutex<ListenerRegistry>>,
    codec: Arc<dyn WireCodec>,
    closed: Arc<AtomicBool>,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl OscSocket {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        Self::bind_with_codec(addr, Arc::new(RoscCodec))
    }

    pub fn bind_with_codec<A: ToSocketAddrs>(addr: A, codec: Arc<dyn WireCodec>) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(OscError::Bind)?;
        socket
            .set_read_timeout(Some(RECEIVE_POLL_INTERVAL))
            .map_err(OscError::Bind)?;
        let socket = Arc::new(socket);
        debug!("OSC socket bound on {:?}", socket.local_addr().ok());

        let registry = Arc::new(Mutex::new(ListenerRegistry::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let receiver = {
            let socket = socket.clone();
            let registry = registry.clone();
            let codec = codec.clone();
            let closed = closed.clone();
            thread::Builder::new()
                .name("osc-receive".to_string())
                .spawn(move || receive_loop(&socket, &registry, codec.as_ref(), &closed))
                .map_err(OscError::Bind)?
        };

        Ok(OscSocket {
            socket,
            registry,
            codec,
            closed,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(OscError::Socket)
    }

    /// Encodes and transmits `message` in a single attempt.
    pub fn send(&self, message: &OscMessage, target: SocketAddr) -> Result<()> {
        if self.is_closed() {
            return Err(OscError::Closed);
        }
        let buf = self.codec.encode(message).map_err(|reason| OscError::Encode {
            address: message.addr.clone(),
            reason,
        })?;
        self.socket
            .send_to(&buf, target)
            .map_err(|source| OscError::Send { target, source })?;
        trace!("sent {} ({} args) to {}", message.addr, message.args.len(), target);
        Ok(())
    }

    /// Registers `handler` for every future message at exactly `address`.
    pub fn on<F>(&self, address: &str, handler: F) -> ListenerId
    where
        F: Fn(&OscMessage, SocketAddr) -> std::result::Result<(), OscError> + Send + Sync + 'static,
    {
        self.add_listener(address, Arc::new(handler), false)
    }

    /// Registers `handler` for the next message at `address` only.
    pub fn once<F>(&self, address: &str, handler: F) -> ListenerId
    where
        F: Fn(&OscMessage, SocketAddr) -> std::result::Result<(), OscError> + Send + Sync + 'static,
    {
        self.add_listener(address, Arc::new(handler), true)
    }

    pub(crate) fn add_listener(&self, address: &str, handler: Handler, once: bool) -> ListenerId {
        self.registry.lock().unwrap().add(address, handler, once)
    }

    /// Removes one handler, or all of them when `id` is `None`.
    pub fn off(&self, address: &str, id: Option<ListenerId>) {
        self.remove_listener(address, id);
    }

    pub(crate) fn remove_listener(&self, address: &str, id: Option<ListenerId>) -> usize {
        let removed = self.registry.lock().unwrap().remove(address, id);
        trace!("removed {removed} listener(s) from {address}");
        removed
    }

    pub fn listener_count(&self, address: &str) -> usize {
        self.registry.lock().unwrap().listener_count(address)
    }

    pub fn set_broadcast(&self, enabled: bool) -> Result<()> {
        self.socket.set_broadcast(enabled).map_err(OscError::Socket)
    }

    /// Stops the receive thread and releases the socket.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let handle = self.receiver.lock().unwrap().take();
        if let Some(handle) = handle {
            // Closing from inside a handler runs on the receive thread itself.
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                warn!("OSC receive thread panicked");
            }
        }
        self.registry.lock().unwrap().clear();
        debug!("OSC socket closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Decodes one datagram and delivers it to the listeners at its address.
    pub fn dispatch(&self, buf: &[u8], from: SocketAddr) -> Result<()> {
        dispatch_datagram(&self.registry, self.codec.as_ref(), buf, from)
    }
}

impl Drop for OscSocket {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn receive_loop(
    socket: &UdpSocket,
    registry: &Mutex<ListenerRegistry>,
    codec: &dyn WireCodec,
    closed: &AtomicBool,
) {
    let mut buf = [0u8; rosc::decoder::MTU];
    while !closed.load(Ordering::SeqCst) {
        let (size, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(e) => {
                if !closed.load(Ordering::SeqCst) {
                    warn!("OSC receive error: {e}");
                    thread::sleep(RECEIVE_POLL_INTERVAL);
                }
                continue;
            }
        };
        if closed.load(Ordering::SeqCst) {
            break;
        }
        match dispatch_datagram(registry, codec, &buf[..size], from) {
            Ok(()) => {}
            Err(err) if err.is_fatal() => {
                error!("stopping OSC receive loop: {err}");
                closed.store(true, Ordering::SeqCst);
                registry.lock().unwrap().clear();
                break;
            }
            Err(err) => warn!("dropping datagram: {err}"),
        }
    }
    trace!("OSC receive loop finished");
}

fn dispatch_datagram(
    registry: &Mutex<ListenerRegistry>,
    codec: &dyn WireCodec,
    buf: &[u8],
    from: SocketAddr,
) -> Result<()> {
    let message = match codec.decode(buf) {
        Ok(OscPacket::Message(message)) => message,
        Ok(OscPacket::Bundle(_)) => return Err(OscError::UnsupportedBundle { from }),
        Err(reason) => return Err(OscError::Decode { from, reason }),
    };

    let handlers = registry.lock().unwrap().take_for_dispatch(&message.addr);
    if handlers.is_empty() {
        trace!("no listener for {} from {}", message.addr, from);
        return Ok(());
    }

    let mut first_error = None;
    for handler in handlers {
        if let Err(err) = handler(&message, from) {
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}
