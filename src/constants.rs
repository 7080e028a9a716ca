//! Protocol constants for the X-Air mixer family.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// UDP port the mixers listen on for OSC, and where discovery probes go.
pub const MIXER_PORT: u16 = 10024;

/// Probe and reply address of the discovery handshake.
pub const DISCOVERY_ADDRESS: &str = "/xinfo";

pub const DEFAULT_BROADCAST_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::BROADCAST);

pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Renews the mixer's push subscription for this client.
pub const XREMOTE_ADDRESS: &str = "/xremote";

/// How often the receive thread wakes up to notice that its socket was closed.
pub const RECEIVE_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub const CHANNEL_COUNT: u8 = 16;
pub const BUS_COUNT: u8 = 6;
pub const EQ_BAND_COUNT: u8 = 4;
pub const HEADAMP_COUNT: u8 = 16;

/// DCA and mute groups are four bits of one integer parameter each.
pub const GROUP_COUNT: u8 = 4;
