// Test doubles shared by the integration tests: a scripted mixer listening on a
// loopback UDP port, and an in-memory `Remote` that records every call.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rosc::{OscMessage, OscPacket, OscType, decoder, encoder};

use xair_osc::osc::{Handler, ListenerId, ListenerRegistry, Remote};
use xair_osc::{OscError, Result};

pub fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
    OscMessage {
        addr: addr.to_string(),
        args,
    }
}

pub fn encode(message: &OscMessage) -> Vec<u8> {
    encoder::encode(&OscPacket::Message(message.clone())).unwrap()
}

pub fn decode(buf: &[u8]) -> OscMessage {
    match decoder::decode_udp(buf).unwrap().1 {
        OscPacket::Message(message) => message,
        other => panic!("expected a message, got {other:?}"),
    }
}

/// What the fake mixer does with an argument-less message at some address.
#[derive(Clone)]
pub enum Reply {
    /// Answer with these replies, in order.
    With(Vec<Vec<OscType>>),
    /// Swallow the query.
    Silent,
}

/// Behaves like the mixer: a query (no arguments) gets the stored value echoed
/// back to the sender, a set (with arguments) updates the stored value.
pub struct FakeMixer {
    pub addr: SocketAddr,
    socket: Arc<UdpSocket>,
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    received: Receiver<(OscMessage, SocketAddr)>,
    stop: Arc<AtomicBool>,
}

impl FakeMixer {
    pub fn start() -> Self {
        Self::start_on("127.0.0.1:0")
    }

    pub fn start_on(bind: &str) -> Self {
        let socket = Arc::new(UdpSocket::bind(bind).unwrap());
        socket
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let addr = socket.local_addr().unwrap();
        let replies: Arc<Mutex<HashMap<String, Reply>>> = Arc::new(Mutex::new(HashMap::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx): (Sender<(OscMessage, SocketAddr)>, _) = unbounded();

        {
            let socket = socket.clone();
            let replies = replies.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut buf = [0u8; decoder::MTU];
                while !stop.load(Ordering::SeqCst) {
                    let Ok((size, from)) = socket.recv_from(&mut buf) else {
                        continue;
                    };
                    let message = decode(&buf[..size]);
                    let _ = tx.send((message.clone(), from));
                    if !message.args.is_empty() {
                        replies
                            .lock()
                            .unwrap()
                            .insert(message.addr.clone(), Reply::With(vec![message.args]));
                        continue;
                    }
                    let reply = replies.lock().unwrap().get(&message.addr).cloned();
                    if let Some(Reply::With(answers)) = reply {
                        for args in answers {
                            let _ = socket.send_to(&encode(&msg(&message.addr, args)), from);
                        }
                    }
                }
            });
        }

        FakeMixer {
            addr,
            socket,
            replies,
            received: rx,
            stop,
        }
    }

    pub fn reply(&self, address: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(address.to_string(), reply);
    }

    pub fn value(&self, address: &str, args: Vec<OscType>) {
        self.reply(address, Reply::With(vec![args]));
    }

    /// Next message the mixer received.
    pub fn next_received(&self) -> (OscMessage, SocketAddr) {
        self.received
            .recv_timeout(Duration::from_millis(500))
            .expect("fake mixer received nothing")
    }

    pub fn nothing_received(&self, wait: Duration) -> bool {
        self.received.recv_timeout(wait).is_err()
    }

    /// Pushes an unsolicited message, as the mixer does after `/xremote`.
    pub fn push(&self, to: SocketAddr, message: &OscMessage) {
        self.socket.send_to(&encode(message), to).unwrap();
    }
}

impl Drop for FakeMixer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Query(String),
    Set(String, Vec<OscType>),
}

/// `Remote` that answers queries from a table and logs every call.
#[derive(Default)]
pub struct RecordingRemote {
    values: Mutex<HashMap<String, Vec<OscType>>>,
    calls: Mutex<Vec<Call>>,
    registry: Mutex<ListenerRegistry>,
}

impl RecordingRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_value(address: &str, args: Vec<OscType>) -> Arc<Self> {
        let remote = Self::default();
        remote
            .values
            .lock()
            .unwrap()
            .insert(address.to_string(), args);
        Arc::new(remote)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Delivers `message` to subscribers, like a push from the mixer.
    pub fn push(&self, message: &OscMessage) -> Result<()> {
        let handlers = self.registry.lock().unwrap().take_for_dispatch(&message.addr);
        let from: SocketAddr = "127.0.0.1:10024".parse().unwrap();
        for handler in handlers {
            handler(message, from)?;
        }
        Ok(())
    }
}

impl Remote for RecordingRemote {
    fn query(&self, address: &str) -> Result<OscMessage> {
        self.calls.lock().unwrap().push(Call::Query(address.to_string()));
        let args = self
            .values
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or(OscError::Closed)?;
        Ok(msg(address, args))
    }

    fn set(&self, address: &str, args: Vec<OscType>) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Set(address.to_string(), args.clone()));
        self.values
            .lock()
            .unwrap()
            .insert(address.to_string(), args);
        Ok(())
    }

    fn subscribe(&self, address: &str, handler: Handler) -> ListenerId {
        self.registry.lock().unwrap().add(address, handler, false)
    }

    fn unsubscribe(&self, address: &str, id: Option<ListenerId>) {
        self.registry.lock().unwrap().remove(address, id);
    }
}
