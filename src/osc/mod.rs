pub mod client;
pub mod codec;
pub mod registry;
pub mod socket;

pub use client::{OscClient, Remote};
pub use codec::{RoscCodec, WireCodec};
pub use registry::{Handler, ListenerId, ListenerRegistry};
pub use socket::OscSocket;
