//! Broadcast discovery of mixers on the local network.
//!
//! A `/xinfo` probe goes out to the broadcast address; every mixer that hears it
//! answers with `/xinfo <ip> <name> <model> [<firmware>]`. Replies are collected
//! for a fixed window and deduplicated by sender IP.

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::{Duration, Instant};

use bimap::BiMap;
use crossbeam_channel::{RecvTimeoutError, unbounded};
use once_cell::sync::Lazy;
use rosc::{OscMessage, OscType};
use serde::Serialize;
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_BROADCAST_ADDRESS, DEFAULT_DISCOVERY_TIMEOUT, DISCOVERY_ADDRESS, MIXER_PORT,
};
use crate::error::{OscError, Result, SchemaError};
use crate::osc::socket::OscSocket;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MixerModel {
    XR12,
    XR16,
    XR18,
    MR18,
    X18,
}

static MODEL_NAMES: Lazy<BiMap<&'static str, MixerModel>> = Lazy::new(|| {
    let mut names = BiMap::new();
    names.insert("XR12", MixerModel::XR12);
    names.insert("XR16", MixerModel::XR16);
    names.insert("XR18", MixerModel::XR18);
    names.insert("MR18", MixerModel::MR18);
    names.insert("X18", MixerModel::X18);
    names
});

impl MixerModel {
    pub fn name(&self) -> &'static str {
        MODEL_NAMES.get_by_right(self).copied().unwrap_or("unknown")
    }
}

impl FromStr for MixerModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MODEL_NAMES
            .get_by_left(s)
            .copied()
            .ok_or_else(|| format!("unknown mixer model {s:?}"))
    }
}

impl Display for MixerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A mixer that answered a discovery probe.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiscoveredDevice {
    pub address: IpAddr,
    pub port: u16,
    pub model: MixerModel,
    pub name: String,
    pub firmware: Option<String>,
}

impl DiscoveredDevice {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

#[derive(Clone, Debug)]
pub struct DiscoveryOptions {
    /// How long to collect replies for. Discovery always waits this long.
    pub timeout: Duration,
    pub broadcast_address: IpAddr,
    pub port: u16,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        DiscoveryOptions {
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            broadcast_address: DEFAULT_BROADCAST_ADDRESS,
            port: MIXER_PORT,
        }
    }
}

/// Fields of a well-formed `/xinfo` reply.
#[derive(Clone, Debug, PartialEq)]
pub struct XinfoReply {
    pub ip: String,
    pub name: String,
    pub model: String,
    pub firmware: Option<String>,
}

impl XinfoReply {
    pub fn parse(message: &OscMessage) -> std::result::Result<Self, SchemaError> {
        let malformed = |reason: String| SchemaError::new(&message.addr, reason);
        if !(3..=4).contains(&message.args.len()) {
            return Err(malformed(format!(
                "expected 3 or 4 string arguments, got {}",
                message.args.len()
            )));
        }
        let mut strings = Vec::with_capacity(message.args.len());
        for (idx, arg) in message.args.iter().enumerate() {
            match arg {
                OscType::String(s) => strings.push(s.clone()),
                other => {
                    return Err(malformed(format!(
                        "argument {idx} should be a string, got {other:?}"
                    )));
                }
            }
        }
        let mut strings = strings.into_iter();
        Ok(XinfoReply {
            ip: strings.next().unwrap_or_default(),
            name: strings.next().unwrap_or_default(),
            model: strings.next().unwrap_or_default(),
            firmware: strings.next(),
        })
    }
}

/// Turns one reply into a device, or `None` when the model isn't one we know.
fn device_from_reply(
    message: &OscMessage,
    from: SocketAddr,
) -> std::result::Result<Option<DiscoveredDevice>, SchemaError> {
    let reply = XinfoReply::parse(message)?;
    let Ok(model) = reply.model.parse::<MixerModel>() else {
        debug!("ignoring {} at {from}: unknown model {:?}", reply.name, reply.model);
        return Ok(None);
    };
    Ok(Some(DiscoveredDevice {
        address: from.ip(),
        port: from.port(),
        model,
        name: reply.name,
        firmware: reply.firmware,
    }))
}

/// Runs one discovery session over its own socket, which it closes when done.
pub struct MixerDiscoverer {
    socket: OscSocket,
}

impl MixerDiscoverer {
    pub fn new() -> Result<Self> {
        Ok(MixerDiscoverer {
            socket: OscSocket::bind(("0.0.0.0", 0))?,
        })
    }

    pub fn with_socket(socket: OscSocket) -> Self {
        MixerDiscoverer { socket }
    }

    /// Probes the network and returns every known mixer that replied within
    /// `options.timeout`, in the order they were first heard from.
    pub fn discover(self, options: DiscoveryOptions) -> Result<Vec<DiscoveredDevice>> {
        let result = self.collect(&options);
        self.socket.close()?;
        result
    }

    fn collect(&self, options: &DiscoveryOptions) -> Result<Vec<DiscoveredDevice>> {
        let (tx, rx) = unbounded();
        self.socket.on(DISCOVERY_ADDRESS, move |message, from| {
            let parsed = device_from_reply(message, from);
            let _ = tx.send(parsed.clone());
            parsed.map(|_| ()).map_err(OscError::from)
        });

        let target = SocketAddr::new(options.broadcast_address, options.port);
        self.socket.set_broadcast(true)?;
        let probe = OscMessage {
            addr: DISCOVERY_ADDRESS.to_string(),
            args: vec![],
        };
        self.socket.send(&probe, target)?;
        self.socket.set_broadcast(false)?;
        info!("discovery probe sent to {target}, listening for {:?}", options.timeout);

        let deadline = Instant::now() + options.timeout;
        let mut devices: Vec<DiscoveredDevice> = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Ok(Some(device))) => {
                    if devices.iter().any(|d| d.address == device.address) {
                        continue;
                    }
                    info!("found {} {:?} at {}", device.model, device.name, device.socket_addr());
                    devices.push(device);
                }
                Ok(Ok(None)) => {}
                Ok(Err(err)) => return Err(err.into()),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Err(OscError::Closed),
            }
        }
        Ok(devices)
    }
}
