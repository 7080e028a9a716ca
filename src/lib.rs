//! Client for the OSC control protocol of the Behringer/Midas X-Air mixer family.
//!
//! The [`osc`] module holds the UDP transport and the query/set client,
//! [`discovery`] finds mixers on the local network and [`params`] converts
//! between raw wire values and human units.

pub mod address;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod osc;
pub mod params;
pub mod traits;

pub use discovery::{DiscoveredDevice, DiscoveryOptions, MixerDiscoverer, MixerModel};
pub use error::{ConversionError, OscError, Result, SchemaError};
pub use osc::{OscClient, OscSocket, Remote};
pub use params::{GroupMask, Mapper, ParamValue, Parameter, UnitValue, WireType};
